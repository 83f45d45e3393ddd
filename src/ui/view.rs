//! Declarative view model bound by whatever renders the UI

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Every select list the front-end shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectId {
    /// Registered airline acting as the registrar.
    RegisteredAirline,
    /// Directory airlines not yet registered.
    AirlineAddress,
    FundingAirline,
    InsuredAirline,
    InsuredFlight,
    StatusAirline,
    StatusFlight,
    /// Passenger buying insurance.
    Passengers,
    /// Passenger whose credit is shown and withdrawn.
    InsuredPassengers,
}

impl SelectId {
    pub const ALL: [SelectId; 9] = [
        SelectId::RegisteredAirline,
        SelectId::AirlineAddress,
        SelectId::FundingAirline,
        SelectId::InsuredAirline,
        SelectId::InsuredFlight,
        SelectId::StatusAirline,
        SelectId::StatusFlight,
        SelectId::Passengers,
        SelectId::InsuredPassengers,
    ];
}

impl fmt::Display for SelectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectId::RegisteredAirline => "registered_airline",
            SelectId::AirlineAddress => "airline_address",
            SelectId::FundingAirline => "funding_airline",
            SelectId::InsuredAirline => "insured_airline",
            SelectId::InsuredFlight => "insured_flight",
            SelectId::StatusAirline => "status_airline",
            SelectId::StatusFlight => "status_flight",
            SelectId::Passengers => "passengers",
            SelectId::InsuredPassengers => "insured_passengers",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SelectList {
    pub options: Vec<SelectOption>,
    pub selected: Option<String>,
}

impl SelectList {
    /// Replaces the options and selects the first one.
    pub fn populate(&mut self, options: Vec<SelectOption>) {
        self.selected = options.first().map(|option| option.value.clone());
        self.options = options;
    }

    /// Selects `value` if it is one of the options.
    pub fn select(&mut self, value: &str) -> bool {
        if self.options.iter().any(|option| option.value == value) {
            self.selected = Some(value.to_string());
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    Value(String),
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub label: String,
    pub outcome: RowOutcome,
}

impl ResultRow {
    pub fn from_result<V: fmt::Display, E: fmt::Display>(
        label: impl Into<String>,
        result: &Result<V, E>,
    ) -> Self {
        let outcome = match result {
            Ok(value) => RowOutcome::Value(value.to_string()),
            Err(err) => RowOutcome::Error(err.to_string()),
        };
        Self {
            label: label.into(),
            outcome,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, RowOutcome::Error(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResultSection {
    pub title: String,
    pub description: String,
    pub rows: Vec<ResultRow>,
}

static EMPTY_LIST: SelectList = SelectList {
    options: Vec::new(),
    selected: None,
};

/// Everything the UI shows. The results panel only ever grows.
#[derive(Clone, Debug, Serialize)]
pub struct ViewModel {
    selects: BTreeMap<SelectId, SelectList>,
    pub operational: Option<bool>,
    /// Funding of the selected funding airline, in ether.
    pub funding: Option<String>,
    /// Credit of the selected insured passenger, in ether.
    pub balance: Option<String>,
    panel: Vec<ResultSection>,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            selects: SelectId::ALL
                .iter()
                .map(|id| (*id, SelectList::default()))
                .collect(),
            operational: None,
            funding: None,
            balance: None,
            panel: Vec::new(),
        }
    }
}

impl ViewModel {
    pub fn select_list(&self, id: SelectId) -> &SelectList {
        self.selects.get(&id).unwrap_or(&EMPTY_LIST)
    }

    pub fn select_list_mut(&mut self, id: SelectId) -> &mut SelectList {
        self.selects.entry(id).or_default()
    }

    pub fn selected(&self, id: SelectId) -> Option<&str> {
        self.selects.get(&id).and_then(SelectList::selected)
    }

    pub fn display(&mut self, title: &str, description: &str, rows: Vec<ResultRow>) {
        self.panel.push(ResultSection {
            title: title.to_string(),
            description: description.to_string(),
            rows,
        });
    }

    pub fn panel(&self) -> &[ResultSection] {
        &self.panel
    }

    pub fn last_section(&self) -> Option<&ResultSection> {
        self.panel.last()
    }
}
