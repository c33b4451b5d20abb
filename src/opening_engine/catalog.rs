//! Opening catalog: the read-only list of families a drill can be built from.
//!
//! The catalog is produced offline and shipped as JSON. It is parsed once into
//! an immutable [`Catalog`]; the built-in copy lives behind [`Catalog::builtin`],
//! which initialises on first use and hands out a `&'static` reference after.

use std::fs;
use std::path::Path;

use log::info;
use once_cell::sync::OnceCell;

use crate::opening_engine::{
    book::BookTree,
    error::{Error, Result},
    models::OpeningFamily,
};

const BUILTIN_JSON: &str = include_str!("../../data/opening_families.json");

static BUILTIN: OnceCell<Catalog> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    families: Vec<OpeningFamily>,
}

impl Catalog {
    pub fn new(families: Vec<OpeningFamily>) -> Self {
        Catalog { families }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let families: Vec<OpeningFamily> = serde_json::from_str(json)?;
        info!("loaded opening catalog with {} families", families.len());
        Ok(Catalog { families })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read catalog {}", path.display()),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// The catalog bundled with the crate.
    pub fn builtin() -> Result<&'static Catalog> {
        BUILTIN.get_or_try_init(|| Catalog::from_json_str(BUILTIN_JSON))
    }

    pub fn families(&self) -> &[OpeningFamily] {
        &self.families
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Exact (case-insensitive) lookup by family name.
    pub fn find(&self, name: &str) -> Option<&OpeningFamily> {
        self.families
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Families whose name, ECO code or any variation name contains `query`.
    /// A blank query returns every family, in catalog order.
    pub fn search<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a OpeningFamily> + 'a {
        self.families.iter().filter(move |f| f.matches(query))
    }

    /// Look up `name` and compile its book, optionally restricted to one line.
    pub fn book(&self, name: &str, variation_index: Option<usize>) -> Result<BookTree> {
        let family = self.find(name).ok_or_else(|| Error::UnknownFamily {
            name: name.to_string(),
        })?;
        BookTree::build(family, variation_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opening_engine::models::Side;

    #[test]
    fn builtin_catalog_loads_once() {
        let a = Catalog::builtin().unwrap();
        let b = Catalog::builtin().unwrap();
        assert!(std::ptr::eq(a, b));
        assert!(!a.is_empty());
    }

    #[test]
    fn builtin_families_are_well_formed() {
        let catalog = Catalog::builtin().unwrap();
        for family in catalog.families() {
            assert!(!family.name.is_empty());
            assert!(!family.eco_code.is_empty(), "{} has no ECO code", family.name);
            assert!(family.variation_count() > 0, "{} has no variations", family.name);
            for v in &family.variations {
                assert!(!v.move_sequence.is_empty(), "{} / {} is empty", family.name, v.name);
            }
        }
    }

    #[test]
    fn every_builtin_line_ends_on_its_own_name() {
        let catalog = Catalog::builtin().unwrap();
        for family in catalog.families() {
            for (index, v) in family.variations.iter().enumerate() {
                let tree = BookTree::build(family, Some(index)).unwrap();
                let info = tree.position_info(&v.move_sequence).unwrap();
                assert_eq!(info.variation_name, Some(v.name.as_str()));
            }
        }
    }

    #[test]
    fn find_and_search() {
        let catalog = Catalog::builtin().unwrap();
        let sicilian = catalog.find("sicilian defense").unwrap();
        assert_eq!(sicilian.default_color, Side::Black);

        let hits: Vec<_> = catalog.search("najdorf").map(|f| f.name.as_str()).collect();
        assert_eq!(hits, vec!["Sicilian Defense"]);

        assert_eq!(catalog.search("  ").count(), catalog.len());
        assert_eq!(catalog.search("D02").next().map(|f| f.name.as_str()), Some("London System"));
        assert!(catalog.find("Bongcloud").is_none());
    }

    #[test]
    fn book_for_unknown_family_is_an_error() {
        let catalog = Catalog::builtin().unwrap();
        assert!(matches!(
            catalog.book("Bongcloud", None),
            Err(Error::UnknownFamily { .. })
        ));
        let italian = catalog.book("Italian Game", None).unwrap();
        assert_eq!(italian.family(), "Italian Game");
        assert_eq!(italian.valid_moves(&["e4"]), vec!["e5"]);
    }

    #[test]
    fn from_json_str_rejects_garbage() {
        assert!(matches!(Catalog::from_json_str("{ nope"), Err(Error::Catalog(_))));
    }

    #[test]
    fn from_path_reports_missing_files() {
        let err = Catalog::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
