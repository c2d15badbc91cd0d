//! Foreign-key enrichment catalog: per (table, column), where the reference
//! points and how to render a human-readable display column next to the raw
//! id on the read path.

use std::collections::BTreeMap;

/// Placeholder substituted with the generated join alias when a display
/// template is rendered.
pub const ALIAS_PLACEHOLDER: &str = "{alias}";

/// One foreign-key reference and its display enrichment.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FkLink {
    /// Table the column references.
    pub target_table: String,
    /// Key column on the target the join matches against.
    pub target_key: String,
    /// Server-side SQL snippet with an `{alias}` placeholder, e.g.
    /// ``CONCAT({alias}.`first_name`, ' ', {alias}.`last_name`)``.
    pub display_template: String,
    /// Alias the rendered display expression is exposed under.
    pub display_alias: String,
}

impl FkLink {
    /// Substitute the join alias into the display template.
    #[must_use]
    pub fn render_display(&self, alias: &str) -> String {
        self.display_template.replace(ALIAS_PLACEHOLDER, alias)
    }
}

/// Flat (table, source column) → link map.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FkCatalog(BTreeMap<String, BTreeMap<String, FkLink>>);

impl FkCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_link(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        link: FkLink,
    ) -> Self {
        self.0
            .entry(table.into())
            .or_default()
            .insert(column.into(), link);
        self
    }

    /// Link for a (table, column) pair; column match is case-insensitive to
    /// line up with schema introspection.
    #[must_use]
    pub fn link(&self, table: &str, column: &str) -> Option<&FkLink> {
        self.0.get(table).and_then(|cols| {
            cols.iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, link)| link)
        })
    }

    /// All links declared for a table, in column order.
    pub fn links_for(&self, table: &str) -> impl Iterator<Item = (&str, &FkLink)> {
        self.0
            .get(table)
            .into_iter()
            .flat_map(|cols| cols.iter().map(|(c, l)| (c.as_str(), l)))
    }

    /// Every declared link as (table, column, link), in table/column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &FkLink)> {
        self.0.iter().flat_map(|(table, cols)| {
            cols.iter()
                .map(move |(col, link)| (table.as_str(), col.as_str(), link))
        })
    }
}
