//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for live catalog browsing.

use serde::{Deserialize, Serialize};
use webinar_catalog_core::{
    domain::{Webinar, WebinarType},
    filter::{FacetKind, FilterState},
};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Switches the content tab (`all`, `upcoming`, `past`).
    SetTab { tab: WebinarType },

    /// Replaces the search text. Applied after the debounce quiet period.
    SetSearch { search: String },

    /// Adds or removes one value of a multi-select facet.
    ToggleFilter { facet: FacetKind, value: String },

    /// Picks a single "what brings you here" category, or none.
    SelectCategory {
        #[serde(default)]
        category: Option<String>,
    },

    /// Sets the recency window: `""`, `"all"` or a day count such as `"30"`.
    SetDateRange { date_range: String },

    /// Moves to a 1-indexed page of the current results.
    SetPage { page: usize },

    /// The "clear all filters" action.
    ClearFilters,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The current page of results for the session's tab and filters.
    Results {
        tab: WebinarType,
        filters: FilterState,
        active_filter_count: usize,
        items: Vec<Webinar>,
        page: usize,
        total_pages: usize,
        total_items: usize,
    },

    /// Reports a rejected message; the session stays open.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_tags() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "toggle_filter", "facet": "integration", "value": "dbt"}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::ToggleFilter { facet: FacetKind::Integration, value: "dbt".to_string() }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"type": "select_category"}"#).unwrap();
        assert_eq!(msg, ClientMessage::SelectCategory { category: None });

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "set_tab", "tab": "upcoming"}"#).unwrap();
        assert_eq!(msg, ClientMessage::SetTab { tab: WebinarType::Upcoming });
    }

    #[test]
    fn server_errors_are_tagged() {
        let json = serde_json::to_value(ServerMessage::Error { message: "bad".to_string() }).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "bad");
    }
}
