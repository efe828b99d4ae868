use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: u32,
    pub title: String,
    pub url: String,
    pub slug: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuSource {
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuResponse {
    pub menu: Vec<MenuItem>,
    #[serde(rename = "type")]
    pub source: MenuSource,
}

/// The remote site exposes no menu endpoint, so navigation is curated here.
pub fn default_menu() -> MenuResponse {
    let items = [
        (1, "Home", "/", "home"),
        (2, "Blog", "/blog", "blog"),
        (3, "About", "/about", "about"),
        (4, "Contact", "/contact", "contact"),
    ];
    MenuResponse {
        menu: items
            .into_iter()
            .map(|(id, title, url, slug)| MenuItem {
                id,
                title: title.to_string(),
                url: url.to_string(),
                slug: slug.to_string(),
            })
            .collect(),
        source: MenuSource::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_menu_targets_local_routes() {
        let menu = default_menu();
        let urls: Vec<_> = menu.menu.iter().map(|m| m.url.as_str()).collect();
        assert_eq!(urls, vec!["/", "/blog", "/about", "/contact"]);

        let json = serde_json::to_value(&menu).unwrap();
        assert_eq!(json["type"], "default");
        assert_eq!(json["menu"][0]["slug"], "home");
    }
}
