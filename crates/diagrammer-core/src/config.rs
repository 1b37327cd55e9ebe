//! Tunable editor constants.

use crate::error::EditorResult;
use serde::{Deserialize, Serialize};

/// What happens to a connector when a shape it is bound to is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DanglingConnectorPolicy {
    /// Freeze the bound end at its last resolved coordinate.
    #[default]
    Detach,
    /// Delete the connector together with the shape.
    Remove,
}

/// Which key commits an inline text edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextCommit {
    /// Enter commits, Shift+Enter inserts a newline.
    #[default]
    Enter,
    /// Enter inserts a newline, only blur (click outside) commits.
    Blur,
}

/// Editor configuration. Every field has a default, so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Max distance from the pointer to a port for snapping a connector end.
    pub snap_tolerance: f64,
    pub port_radius: f64,
    pub port_highlight_radius: f64,
    /// Distance within which a pointer-down on a visible port starts a connector.
    pub port_hit_radius: f64,
    pub handle_hit_tolerance: f64,
    pub hit_tolerance: f64,
    pub page_width: f64,
    pub page_height: f64,
    /// Page grid growth step, as a fraction of a page.
    pub page_step: f64,
    /// Margin kept around content, as a fraction of a page.
    pub content_padding: f64,
    pub min_shape_size: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Max history snapshots retained; `None` keeps everything.
    pub history_limit: Option<usize>,
    pub dangling_connectors: DanglingConnectorPolicy,
    pub duplicate_offset: f64,
    pub paste_offset: f64,
    pub text_commit: TextCommit,
    pub remove_empty_text: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: 14.0,
            port_radius: 5.0,
            port_highlight_radius: 7.0,
            port_hit_radius: 8.0,
            handle_hit_tolerance: 8.0,
            hit_tolerance: 4.0,
            page_width: 794.0,
            page_height: 1123.0,
            page_step: 0.5,
            content_padding: 0.1,
            min_shape_size: 4.0,
            min_zoom: 0.1,
            max_zoom: 5.0,
            history_limit: Some(100),
            dangling_connectors: DanglingConnectorPolicy::Detach,
            duplicate_offset: 20.0,
            paste_offset: 20.0,
            text_commit: TextCommit::Enter,
            remove_empty_text: true,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON override on top of the defaults.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
