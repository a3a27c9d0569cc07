use serde::{Deserialize, Serialize};

/// A node in the category tree served by `GET /categories/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub icon: Option<String>,
    /// Missing or `null` children decode as a leaf.
    #[serde(default, deserialize_with = "children_or_empty")]
    pub children: Vec<Category>,
}

fn children_or_empty<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vec<Category>, D::Error> {
    let children: Option<Vec<Category>> = Deserialize::deserialize(deserializer)?;
    Ok(children.unwrap_or_default())
}

impl Category {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Depth-first search for a category by slug anywhere in the forest.
pub fn find_by_slug<'a>(categories: &'a [Category], slug: &str) -> Option<&'a Category> {
    categories.iter().find_map(|c| {
        if c.slug == slug {
            Some(c)
        } else {
            find_by_slug(&c.children, slug)
        }
    })
}

/// Follow a slug path from the roots, e.g. `["electronics", "phones"]`.
///
/// An empty path yields `None`.
pub fn find_by_path<'a, S: AsRef<str>>(categories: &'a [Category], path: &[S]) -> Option<&'a Category> {
    let (first, rest) = path.split_first()?;
    let mut current = categories.iter().find(|c| c.slug == first.as_ref())?;
    for slug in rest {
        current = current.children.iter().find(|c| c.slug == slug.as_ref())?;
    }
    Some(current)
}

/// Breadcrumb chain from a root down to the category with `id`, inclusive.
pub fn path_to(categories: &[Category], id: u32) -> Option<Vec<&Category>> {
    for category in categories {
        if category.id == id {
            return Some(vec![category]);
        }
        if let Some(mut tail) = path_to(&category.children, id) {
            tail.insert(0, category);
            return Some(tail);
        }
    }
    None
}

/// Recursively order siblings by `sort_order`, then name.
pub fn sort_tree(categories: &mut [Category]) {
    categories.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
    for category in categories.iter_mut() {
        sort_tree(&mut category.children);
    }
}
