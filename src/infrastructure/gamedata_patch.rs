//! Game-data patch
//!
//! Inserts the harvested `sex` into NPC entries of the JS game-data source.
//! Entries are single lines of the form
//! `{ name: 'Aelin', position: { x: 1, y: 2 }, ... }`; the field is placed
//! right after the `position` object and only on lines that lack it.

use regex::Regex;

use super::parsing_error::{ParsingError, ParsingResult};
use crate::domain::NpcDatabase;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSummary {
    /// Lines that received the field
    pub lines_updated: usize,
    /// NPC entry lines already carrying the field
    pub lines_already_patched: usize,
    /// NPC entry lines without a usable database value
    pub lines_without_data: usize,
}

pub struct GameDataPatcher {
    name_pattern: Regex,
    position_pattern: Regex,
}

impl GameDataPatcher {
    pub fn new() -> ParsingResult<Self> {
        Ok(Self {
            name_pattern: compile(r"name:\s*'([^']+)'")?,
            position_pattern: compile(r"position:\s*\{[^}]+\}")?,
        })
    }

    /// Patch `content` line by line. Lines are split on `\n` and rejoined
    /// the same way, so untouched lines are preserved byte for byte.
    pub fn patch(&self, content: &str, database: &NpcDatabase) -> (String, PatchSummary) {
        let mut summary = PatchSummary::default();

        let lines: Vec<String> = content
            .split('\n')
            .map(|line| self.patch_line(line, database, &mut summary))
            .collect();

        (lines.join("\n"), summary)
    }

    fn patch_line(&self, line: &str, database: &NpcDatabase, summary: &mut PatchSummary) -> String {
        if !(line.contains("name: '") && line.contains("position:")) {
            return line.to_string();
        }

        let Some(name) = self
            .name_pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
        else {
            return line.to_string();
        };

        if line.contains(", sex:") {
            summary.lines_already_patched += 1;
            return line.to_string();
        }

        let (Some(sex), Some(position)) =
            (database.sex_of(name), self.position_pattern.find(line))
        else {
            summary.lines_without_data += 1;
            return line.to_string();
        };

        summary.lines_updated += 1;
        let end = position.end();
        format!("{}, sex: '{}'{}", &line[..end], sex, &line[end..])
    }
}

fn compile(pattern: &str) -> ParsingResult<Regex> {
    Regex::new(pattern).map_err(|e| ParsingError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NpcRecord;

    fn database() -> NpcDatabase {
        [
            NpcRecord::new("Aelin").with_sex("Female"),
            NpcRecord::new("Borin"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_inserts_sex_after_position() {
        let patcher = GameDataPatcher::new().unwrap();
        let content = "  { name: 'Aelin', position: { x: 1, y: 2 }, realm: 'Alsius' },";

        let (patched, summary) = patcher.patch(content, &database());
        assert_eq!(
            patched,
            "  { name: 'Aelin', position: { x: 1, y: 2 }, sex: 'Female', realm: 'Alsius' },"
        );
        assert_eq!(summary.lines_updated, 1);
    }

    #[test]
    fn test_leaves_other_lines_untouched() {
        let patcher = GameDataPatcher::new().unwrap();
        let content = concat!(
            "export const npcs = [\r\n",
            "  { name: 'Aelin', position: { x: 1, y: 2 }, sex: 'Female' },\n",
            "  { name: 'Borin', position: { x: 3, y: 4 } },\n",
            "  { name: 'Zed', position: { x: 5, y: 6 } },\n",
            "  { name: 'Aelin' },\n",
            "];\n",
        );

        let (patched, summary) = patcher.patch(content, &database());
        assert_eq!(patched, content);
        assert_eq!(
            summary,
            PatchSummary {
                lines_updated: 0,
                lines_already_patched: 1,
                lines_without_data: 2,
            }
        );
    }

    #[test]
    fn test_patch_is_idempotent() {
        let patcher = GameDataPatcher::new().unwrap();
        let content = "{ name: 'Aelin', position: { x: 1, y: 2 } }\n";

        let (once, _) = patcher.patch(content, &database());
        let (twice, summary) = patcher.patch(&once, &database());
        assert_eq!(once, twice);
        assert_eq!(summary.lines_updated, 0);
    }
}
