//! Service Catalog
//!
//! The portal's list of services and who may see them. Group membership
//! comes from the session's `groups` claim; the catalog only compares.

use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ServiceCategory {
    Media,
    Productivity,
    Infrastructure,
    #[serde(rename = "Disasters / Emergencies")]
    DisastersEmergencies,
}

/// Who may use a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "groups")]
pub enum ServiceAccess {
    /// Any authenticated user
    All,
    /// Members of at least one of these groups
    Groups(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub url: String,
    pub color: String,
    pub categories: Vec<ServiceCategory>,
    pub access: ServiceAccess,
    pub featured: bool,
}

impl Service {
    pub fn has_access(&self, groups: &BTreeSet<String>) -> bool {
        match &self.access {
            ServiceAccess::All => true,
            ServiceAccess::Groups(required) => required.iter().any(|g| groups.contains(g)),
        }
    }
}

/// Services of one category, in catalog order
#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup<'a> {
    pub category: ServiceCategory,
    pub services: Vec<&'a Service>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    services: Vec<Service>,
}

impl Catalog {
    pub fn new(services: Vec<Service>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn list_accessible<'a>(
        &'a self,
        groups: &BTreeSet<String>,
    ) -> impl Iterator<Item = &'a Service> {
        self.services.iter().filter(move |s| s.has_access(groups))
    }

    pub fn featured(&self, groups: &BTreeSet<String>) -> Vec<&Service> {
        self.list_accessible(groups).filter(|s| s.featured).collect()
    }

    /// Accessible non-featured services by category. Categories appear in
    /// the order they are first met; empty ones are left out.
    pub fn by_category(&self, groups: &BTreeSet<String>) -> Vec<CategoryGroup<'_>> {
        let mut grouped: Vec<CategoryGroup<'_>> = Vec::new();

        for service in self.list_accessible(groups).filter(|s| !s.featured) {
            for &category in &service.categories {
                match grouped.iter_mut().find(|g| g.category == category) {
                    Some(group) => group.services.push(service),
                    None => grouped.push(CategoryGroup {
                        category,
                        services: vec![service],
                    }),
                }
            }
        }

        grouped
    }

    /// The portal's built-in service list
    pub fn portal() -> Self {
        use ServiceCategory::*;

        let all = || ServiceAccess::All;
        let groups = |names: &[&str]| ServiceAccess::Groups(names.iter().map(|n| n.to_string()).collect());

        Self::new(vec![
            service("Jellyfin", "Movies, TV shows and Karaoke", "jellyfin", "https://media.danger.direct", "#00a4dc", &[Media], all(), true),
            service("Komga", "Comic and manga server", "komga", "https://books.danger.direct", "#4caf50", &[Media], all(), true),
            service("PinePods", "Podcast server", "pinepods", "https://podcasts.danger.direct", "#4caf50", &[Media], all(), true),
            service("Romm", "ROM management and game library", "romm", "https://games.danger.direct", "#9c27b0", &[Media], all(), true),
            service("Immich", "Self-hosted photo and video backup", "immich", "https://photos.danger.direct", "#4250af", &[Media], groups(&["immich"]), true),
            service("PocketID", "Identity and access management", "pocket-id", "https://id.danger.direct", "#6366f1", &[Infrastructure], all(), true),
            service("Kiwix", "Offline Wikipedia and educational content", "kiwix", "https://kiwix.danger.direct", "#ff9800", &[DisastersEmergencies], groups(&["disaster_prep"]), false),
            service("Coolify", "Self-hosted deployment platform", "coolify", "https://manage.danger.direct", "#6b21a8", &[Infrastructure], groups(&["infrastructure"]), false),
            service("Static Assets", "Static files and media CDN", "cdn", "https://danger.direct/cdn", "#64748b", &[Infrastructure], groups(&["infrastructure"]), false),
            service("Pairdrop", "Local file sharing and transfer", "pairdrop", "https://share.danger.direct", "#10b981", &[DisastersEmergencies, Productivity], groups(&["disaster_prep"]), false),
            service("Traccar", "GPS tracking and location services", "traccar", "https://track.danger.direct", "#f59e0b", &[DisastersEmergencies], groups(&["disaster_prep"]), false),
            service("Seafile", "File sync and collaboration platform", "seafile", "https://drive.danger.direct", "#0ea5e9", &[Productivity], groups(&["productivity"]), false),
            service("Code Server", "VS Code in the browser", "code-server", "https://code.danger.direct", "#0078d4", &[Productivity], groups(&["productivity"]), false),
        ])
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::portal()
    }
}

#[allow(clippy::too_many_arguments)]
fn service(
    name: &str,
    description: &str,
    icon: &str,
    url: &str,
    color: &str,
    categories: &[ServiceCategory],
    access: ServiceAccess,
    featured: bool,
) -> Service {
    Service {
        name: name.to_string(),
        description: description.to_string(),
        icon: format!("/icons/{icon}.svg"),
        url: url.to_string(),
        color: color.to_string(),
        categories: categories.to_vec(),
        access,
        featured,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn names<'a>(services: impl IntoIterator<Item = &'a Service>) -> Vec<&'a str> {
        services.into_iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_has_access() {
        let catalog = Catalog::portal();
        let immich = catalog.services().iter().find(|s| s.name == "Immich").unwrap();
        let jellyfin = catalog.services().iter().find(|s| s.name == "Jellyfin").unwrap();

        assert!(jellyfin.has_access(&groups(&[])));
        assert!(!immich.has_access(&groups(&[])));
        assert!(!immich.has_access(&groups(&["productivity"])));
        assert!(immich.has_access(&groups(&["productivity", "immich"])));
    }

    #[test]
    fn test_list_accessible_keeps_catalog_order() {
        let catalog = Catalog::portal();
        let no_groups = groups(&[]);
        assert_eq!(
            names(catalog.list_accessible(&no_groups)),
            vec!["Jellyfin", "Komga", "PinePods", "Romm", "PocketID"]
        );

        let everything = groups(&["immich", "disaster_prep", "infrastructure", "productivity"]);
        assert_eq!(catalog.list_accessible(&everything).count(), 13);
    }

    #[test]
    fn test_featured() {
        let catalog = Catalog::portal();
        assert_eq!(
            names(catalog.featured(&groups(&["immich"]))),
            vec!["Jellyfin", "Komga", "PinePods", "Romm", "Immich", "PocketID"]
        );
    }

    #[test]
    fn test_by_category() {
        let catalog = Catalog::portal();

        assert!(catalog.by_category(&groups(&[])).is_empty());

        let grouped = catalog.by_category(&groups(&["disaster_prep", "productivity"]));
        let shape: Vec<_> = grouped
            .iter()
            .map(|g| (g.category, names(g.services.iter().copied())))
            .collect();
        assert_eq!(
            shape,
            vec![
                (ServiceCategory::DisastersEmergencies, vec!["Kiwix", "Pairdrop", "Traccar"]),
                (ServiceCategory::Productivity, vec!["Pairdrop", "Seafile", "Code Server"]),
            ]
        );
    }

    #[test]
    fn test_category_serialization() {
        assert_eq!(
            serde_json::to_value(ServiceCategory::DisastersEmergencies).unwrap(),
            "Disasters / Emergencies"
        );
        assert_eq!(
            serde_json::to_value(ServiceAccess::Groups(vec!["immich".into()])).unwrap(),
            serde_json::json!({"kind": "groups", "groups": ["immich"]})
        );
        assert_eq!(
            serde_json::to_value(ServiceAccess::All).unwrap(),
            serde_json::json!({"kind": "all"})
        );
    }
}
