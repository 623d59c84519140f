//! Sub-tasks: the decomposition steps under a triage item.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether the audience can already perform a sub-task.
///
/// Wire values match the UI copy verbatim, including the spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubTaskNovelty {
    #[serde(rename = "New")]
    New,
    #[serde(rename = "Already can do")]
    AlreadyCanDo,
    #[serde(rename = "Uncertain")]
    Uncertain,
}

impl SubTaskNovelty {
    /// Sub-tasks the course must actually teach. `Uncertain` is treated
    /// as teachable until someone confirms otherwise.
    pub fn needs_teaching(&self) -> bool {
        !matches!(self, SubTaskNovelty::AlreadyCanDo)
    }
}

impl fmt::Display for SubTaskNovelty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubTaskNovelty::New => "New",
            SubTaskNovelty::AlreadyCanDo => "Already can do",
            SubTaskNovelty::Uncertain => "Uncertain",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SubTaskNovelty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(SubTaskNovelty::New),
            "already can do" | "already" | "can" => Ok(SubTaskNovelty::AlreadyCanDo),
            "uncertain" | "unsure" => Ok(SubTaskNovelty::Uncertain),
            _ => Err(format!("Invalid novelty: {}", s)),
        }
    }
}

/// One step in the breakdown of a triage item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: String,
    pub parent_item_id: String,
    pub text: String,
    pub is_new: SubTaskNovelty,
    #[serde(default)]
    pub sort_order: i64,
}

impl SubTask {
    pub fn new(
        id: impl Into<String>,
        parent_item_id: impl Into<String>,
        text: impl Into<String>,
        sort_order: i64,
    ) -> Self {
        Self {
            id: id.into(),
            parent_item_id: parent_item_id.into(),
            text: text.into(),
            is_new: SubTaskNovelty::New,
            sort_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_novelty_teaching() {
        assert!(SubTaskNovelty::New.needs_teaching());
        assert!(SubTaskNovelty::Uncertain.needs_teaching());
        assert!(!SubTaskNovelty::AlreadyCanDo.needs_teaching());
    }

    #[test]
    fn test_novelty_parses_shorthand() {
        assert_eq!("can".parse::<SubTaskNovelty>().unwrap(), SubTaskNovelty::AlreadyCanDo);
        assert_eq!("unsure".parse::<SubTaskNovelty>().unwrap(), SubTaskNovelty::Uncertain);
        assert_eq!("NEW".parse::<SubTaskNovelty>().unwrap(), SubTaskNovelty::New);
        assert!("maybe".parse::<SubTaskNovelty>().is_err());
    }

    #[test]
    fn test_novelty_wire_values() {
        assert_eq!(
            serde_json::to_string(&SubTaskNovelty::AlreadyCanDo).unwrap(),
            "\"Already can do\""
        );
        let parsed: SubTaskNovelty = serde_json::from_str("\"Already can do\"").unwrap();
        assert_eq!(parsed, SubTaskNovelty::AlreadyCanDo);
    }

    #[test]
    fn test_sub_task_wire_shape() {
        let task = SubTask::new("s1", "t1", "Read the chart", 0);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["parentItemId"], "t1");
        assert_eq!(json["isNew"], "New");
    }
}
