use regex::Regex;
use std::sync::LazyLock;

/// 範本中未修改的預設文字
pub const DEFAULT_PLACEHOLDER: &str = "Click here to enter text";

const CHECKED_YES: &str = "☒ Yes";
const CHECKED_NO: &str = "☒ No";

static LEADER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Project lead:\s*(.*)").expect("leader pattern is valid"));
static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Project number:\s*(\d+)").expect("number pattern is valid"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checkboxes {
    pub yes: bool,
    pub no: bool,
}

impl Checkboxes {
    /// 至少勾選了其中一個
    pub fn answered(&self) -> bool {
        self.yes || self.no
    }
}

/// 未勾選（☐）與完全沒有勾選框同樣視為 false
pub fn parse_checkboxes(text: &str) -> Checkboxes {
    let normalized: String = text
        .chars()
        .filter(|c| !matches!(c, '\u{200b}' | '\u{2003}'))
        .collect();
    let normalized = normalized.trim();

    Checkboxes {
        yes: normalized.contains(CHECKED_YES),
        no: normalized.contains(CHECKED_NO),
    }
}

/// 子字串比對：只要還留著預設文字就算沒填
pub fn text_is_not_default(text: &str, default_text: &str) -> bool {
    !text.contains(default_text)
}

/// 非空且不是範本預設文字
pub fn has_content(text: &str) -> bool {
    !text.is_empty() && text_is_not_default(text, DEFAULT_PLACEHOLDER)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectInfo {
    pub leader: Option<String>,
    pub number: Option<String>,
}

impl ProjectInfo {
    pub fn is_complete(&self) -> bool {
        self.leader.is_some() && self.number.is_some()
    }
}

pub fn project_info(text: &str) -> ProjectInfo {
    ProjectInfo {
        leader: LEADER_PATTERN
            .captures(text)
            .map(|caps| caps[1].trim().to_string()),
        number: NUMBER_PATTERN
            .captures(text)
            .map(|caps| caps[1].trim().to_string()),
    }
}
