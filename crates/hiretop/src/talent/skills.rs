use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{Skill, SkillId};

const DEFAULT_CATEGORY: &str = "General";

/// Skill reference data keyed by id. Names are unique case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillCatalog {
    skills: BTreeMap<SkillId, Skill>,
}

impl SkillCatalog {
    pub fn standard() -> Self {
        let mut catalog = Self::default();
        for (name, category) in [
            ("Rust", "Backend"),
            ("TypeScript", "Frontend"),
            ("React", "Frontend"),
            ("Node.js", "Backend"),
            ("PostgreSQL", "Data"),
            ("Python", "Data"),
            ("Docker", "DevOps"),
            ("Figma", "Design"),
            ("Project Management", "Management"),
            ("Communication", "Soft Skills"),
        ] {
            catalog.push(name, category);
        }
        catalog
    }

    /// Reads a `name,category` CSV export. Blank and repeated names are skipped.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut catalog = Self::default();

        for record in csv_reader.deserialize::<SkillRow>() {
            let row = record?;
            if row.name.is_empty() {
                continue;
            }
            let category = row.category.as_deref().unwrap_or(DEFAULT_CATEGORY);
            catalog.push(&row.name, category);
        }

        Ok(catalog)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        let file = File::open(path).map_err(csv::Error::from)?;
        Self::from_csv_reader(file)
    }

    fn push(&mut self, name: &str, category: &str) {
        if self.by_name(name).is_some() {
            return;
        }
        let id = SkillId(self.skills.len() as u32 + 1);
        self.skills.insert(
            id,
            Skill {
                id,
                name: name.to_string(),
                category: category.to_string(),
            },
        );
    }

    pub fn get(&self, id: SkillId) -> Option<&Skill> {
        self.skills.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Skill> {
        self.skills
            .values()
            .find(|skill| skill.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.skills.values()
    }

    pub fn into_skills(self) -> Vec<Skill> {
        self.skills.into_values().collect()
    }
}

#[derive(Debug, Deserialize)]
struct SkillRow {
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    category: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_csv_and_assigns_sequential_ids() {
        let csv = "name,category\nRust,Backend\n  go , \nrust,Systems\n,Ignored\n";
        let catalog = SkillCatalog::from_csv_reader(Cursor::new(csv)).expect("parses");

        assert_eq!(catalog.len(), 2);
        let rust = catalog.by_name("RUST").expect("rust present");
        assert_eq!(rust.id, SkillId(1));
        assert_eq!(rust.category, "Backend");
        let go = catalog.get(SkillId(2)).expect("go present");
        assert_eq!(go.name, "go");
        assert_eq!(go.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn rejects_rows_missing_name_column() {
        let csv = "label\nRust\n";
        assert!(SkillCatalog::from_csv_reader(Cursor::new(csv)).is_err());
    }

    #[test]
    fn standard_catalog_is_seeded() {
        let catalog = SkillCatalog::standard();
        assert!(catalog.by_name("react").is_some());
        assert_eq!(catalog.iter().count(), catalog.len());
    }
}
