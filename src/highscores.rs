//! Top-5 leaderboard cache and the highscore endpoint's wire types
//!
//! The server owns the board. Locally we keep the last response plus any
//! optimistic merge of our own submission until the server answers.

use serde::{Deserialize, Serialize};

use crate::consts::{LEADERBOARD_SIZE, MAX_NAME_LEN};
use crate::error::NetworkError;

/// Endpoint for both GET and POST
pub const HIGHSCORES_PATH: &str = "/api/highscores";

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
}

/// `GET` and `POST` response body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoresResponse {
    #[serde(default)]
    pub scores: Vec<LeaderboardEntry>,
    /// Issued on first submit, echoed back on later ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ScoresResponse {
    pub fn from_json(body: &str) -> Result<Self, NetworkError> {
        serde_json::from_str(body).map_err(|e| NetworkError::Malformed(e.to_string()))
    }
}

/// `POST` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub name: String,
    pub score: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Sorted (descending), one row per name, at most `LEADERBOARD_SIZE` rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Take the server's board wholesale. Names are cleaned the same way as
    /// typed ones; rows left without a name are dropped.
    pub fn replace(&mut self, entries: Vec<LeaderboardEntry>) {
        self.entries = entries
            .into_iter()
            .filter_map(|entry| {
                sanitize_name(&entry.name).map(|name| LeaderboardEntry {
                    name,
                    score: entry.score,
                })
            })
            .collect();
        self.normalize();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lowest(&self) -> Option<u64> {
        self.entries.last().map(|e| e.score)
    }

    /// Row index held by `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Whether `score` earns a name-entry prompt.
    ///
    /// A player already on the board has to beat their own row. Anyone else
    /// qualifies on a short board or by reaching the lowest score.
    pub fn qualifies(&self, score: u64, own_name: Option<&str>) -> bool {
        if score == 0 {
            return false;
        }
        let own = own_name.and_then(|name| self.entries.iter().find(|e| e.name == name));
        if let Some(entry) = own {
            return score > entry.score;
        }
        if self.entries.len() < LEADERBOARD_SIZE {
            return true;
        }
        self.lowest().is_none_or(|lowest| score >= lowest)
    }

    /// Optimistically fold in our own submission before the server answers
    pub fn merge_submission(&mut self, name: &str, score: u64) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.score = entry.score.max(score),
            None => self.entries.push(LeaderboardEntry {
                name: name.to_string(),
                score,
            }),
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        // Stable: equal scores keep server order
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        let mut seen: Vec<String> = Vec::with_capacity(self.entries.len());
        self.entries.retain(|e| {
            if seen.contains(&e.name) {
                false
            } else {
                seen.push(e.name.clone());
                true
            }
        });
        self.entries.truncate(LEADERBOARD_SIZE);
    }
}

/// Accepted name-entry character, upper-cased
pub fn normalize_name_char(c: char) -> Option<char> {
    if c.is_ascii_alphanumeric() || c == '-' {
        Some(c.to_ascii_uppercase())
    } else {
        None
    }
}

/// Clean up a stored or typed name. `None` when nothing valid remains.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let name: String = raw
        .chars()
        .filter_map(normalize_name_char)
        .take(MAX_NAME_LEN)
        .collect();
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(rows: &[(&str, u64)]) -> Leaderboard {
        let mut board = Leaderboard::new();
        board.replace(
            rows.iter()
                .map(|(n, s)| LeaderboardEntry {
                    name: n.to_string(),
                    score: *s,
                })
                .collect(),
        );
        board
    }

    #[test]
    fn test_replace_sorts_dedupes_and_caps() {
        let b = board(&[
            ("A", 10),
            ("B", 90),
            ("A", 50),
            ("C", 30),
            ("D", 20),
            ("E", 70),
            ("F", 5),
        ]);
        let names: Vec<&str> = b.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B", "E", "A", "C", "D"]);
        assert_eq!(b.entries[2].score, 50);
    }

    #[test]
    fn test_replace_normalizes_server_names() {
        let b = board(&[("ace", 90), ("Bo b", 80), ("!!", 70), ("ACE", 10)]);
        let names: Vec<&str> = b.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["ACE", "BOB"]);
        assert_eq!(b.position("ACE"), Some(0));
        // Own row is found despite the server's casing
        assert!(!b.qualifies(50, Some("ACE")));
        assert!(b.qualifies(91, Some("ACE")));
    }

    #[test]
    fn test_qualification_rules() {
        let full = board(&[("A", 100), ("B", 80), ("C", 60), ("D", 50), ("E", 40)]);
        assert!(!full.qualifies(37, None));
        assert!(full.qualifies(40, None), "ties with the lowest row qualify");
        assert!(full.qualifies(41, None));
        // Own row must be beaten, wherever it sits
        assert!(!full.qualifies(70, Some("B")));
        assert!(full.qualifies(81, Some("B")));
        // Unknown saved name falls back to the general rule
        assert!(full.qualifies(45, Some("ZED")));

        let short = board(&[("A", 100)]);
        assert!(short.qualifies(1, None));
        assert!(!short.qualifies(0, None));
        assert!(!Leaderboard::new().qualifies(0, None));
    }

    #[test]
    fn test_merge_submission_dedupes_by_name() {
        let mut b = board(&[("A", 100), ("B", 80), ("C", 60), ("D", 50), ("E", 40)]);
        b.merge_submission("C", 30);
        assert_eq!(b.entries[b.position("C").unwrap_or(9)].score, 60);
        b.merge_submission("C", 95);
        assert_eq!(b.position("C"), Some(1));
        assert_eq!(b.entries.len(), 5);

        b.merge_submission("NEW", 45);
        assert_eq!(b.entries.len(), 5);
        assert_eq!(b.lowest(), Some(45));
        assert_eq!(b.position("E"), None);
    }

    #[test]
    fn test_name_filtering() {
        assert_eq!(normalize_name_char('a'), Some('A'));
        assert_eq!(normalize_name_char('7'), Some('7'));
        assert_eq!(normalize_name_char('-'), Some('-'));
        assert_eq!(normalize_name_char(' '), None);
        assert_eq!(normalize_name_char('é'), None);
        assert_eq!(sanitize_name("vi v_ian-2026!").as_deref(), Some("VIVIAN-2026"));
        assert_eq!(sanitize_name("!!!"), None);
        assert_eq!(sanitize_name(&"x".repeat(40)).map(|n| n.len()), Some(16));
    }

    #[test]
    fn test_wire_shapes() {
        let resp = ScoresResponse::from_json(r#"{"scores":[{"name":"AB","score":12}]}"#)
            .unwrap_or_default();
        assert_eq!(resp.scores.len(), 1);
        assert_eq!(resp.token, None);
        assert_eq!(ScoresResponse::from_json("{}").map(|r| r.scores.len()), Ok(0));
        assert!(matches!(
            ScoresResponse::from_json("<html>"),
            Err(NetworkError::Malformed(_))
        ));

        let body = serde_json::to_string(&SubmitRequest {
            name: "AB".into(),
            score: 3,
            token: None,
        })
        .unwrap();
        assert_eq!(body, r#"{"name":"AB","score":3}"#);
    }
}
