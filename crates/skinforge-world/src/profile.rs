//! Game profiles and their property multimap.

use skinforge_protocol::{PlayerUuid, ProfileProperty};

/// A name → property multimap, the way the server stores profile
/// properties. The same name may appear more than once; skin code keeps
/// `textures` unique by always calling [`remove_all`](Self::remove_all)
/// before [`put`](Self::put).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    entries: Vec<ProfileProperty>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property. Existing properties with the same name stay.
    pub fn put(&mut self, property: ProfileProperty) {
        self.entries.push(property);
    }

    /// Removes every property called `name`. Returns how many went.
    pub fn remove_all(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|p| p.name != name);
        before - self.entries.len()
    }

    /// All properties called `name`, in insertion order.
    pub fn get<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a ProfileProperty> {
        self.entries.iter().filter(move |p| p.name == name)
    }

    /// The first property called `name`.
    pub fn first(&self, name: &str) -> Option<&ProfileProperty> {
        self.get(name).next()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfileProperty> {
        self.entries.iter()
    }
}

impl FromIterator<ProfileProperty> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = ProfileProperty>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// The authenticated identity of an online player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProfile {
    pub id: PlayerUuid,
    pub name: String,
    pub properties: PropertyMap,
}

impl GameProfile {
    pub fn new(id: PlayerUuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            properties: PropertyMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str, value: &str) -> ProfileProperty {
        ProfileProperty {
            name: name.into(),
            value: value.into(),
            signature: None,
        }
    }

    #[test]
    fn test_put_keeps_duplicates() {
        let mut map = PropertyMap::new();
        map.put(prop("textures", "a"));
        map.put(prop("textures", "b"));
        assert_eq!(map.get("textures").count(), 2);
        assert_eq!(map.first("textures").unwrap().value, "a");
    }

    #[test]
    fn test_remove_all_only_touches_named_property() {
        let mut map: PropertyMap = [prop("textures", "a"), prop("other", "x"), prop("textures", "b")]
            .into_iter()
            .collect();
        assert_eq!(map.remove_all("textures"), 2);
        assert_eq!(map.len(), 1);
        assert!(map.first("other").is_some());
        assert_eq!(map.remove_all("textures"), 0);
    }
}
