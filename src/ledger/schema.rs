//! Ledger columns and how a [`Record`] renders into them
//!
//! Columns are matched by name, never by position. Header names are
//! normalized (lowercase, letters and digits only) before matching, so the
//! legacy spellings `New Patrons`, `ILL Lent` or `Day of Week Index` land on
//! the same columns as `NewPatrons`, `ILLLent` and `DayOfWeekIndex`.

use crate::record::Record;

/// Date format of the `Date` column
pub const DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Date,
    DoorCount,
    CheckedOut,
    TotalSelfCheck,
    DeskCheckOut,
    Renewed,
    TotalCheckedIn,
    TotalCheckedOutReporting,
    Holds,
    NewPatrons,
    NewCantonPatrons,
    CurbAppt,
    IllLent,
    IllBorrowed,
    DayOfWeek,
    Month,
    Year,
    Day,
    DayOfWeekIndex,
    Comments,
}

impl Column {
    /// Canonical column order of the ledger file
    pub const ALL: [Column; 21] = [
        Column::Id,
        Column::Date,
        Column::DoorCount,
        Column::CheckedOut,
        Column::TotalSelfCheck,
        Column::DeskCheckOut,
        Column::Renewed,
        Column::TotalCheckedIn,
        Column::TotalCheckedOutReporting,
        Column::Holds,
        Column::NewPatrons,
        Column::NewCantonPatrons,
        Column::CurbAppt,
        Column::IllLent,
        Column::IllBorrowed,
        Column::DayOfWeek,
        Column::Month,
        Column::Year,
        Column::Day,
        Column::DayOfWeekIndex,
        Column::Comments,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Id => "Id",
            Column::Date => "Date",
            Column::DoorCount => "DoorCount",
            Column::CheckedOut => "CheckedOut",
            Column::TotalSelfCheck => "TotalSelfCheck",
            Column::DeskCheckOut => "DeskCheckOut",
            Column::Renewed => "Renewed",
            Column::TotalCheckedIn => "TotalCheckedIn",
            Column::TotalCheckedOutReporting => "TotalCheckedOutReporting",
            Column::Holds => "Holds",
            Column::NewPatrons => "NewPatrons",
            Column::NewCantonPatrons => "NewCantonPatrons",
            Column::CurbAppt => "CurbAppt",
            Column::IllLent => "ILLLent",
            Column::IllBorrowed => "ILLBorrowed",
            Column::DayOfWeek => "DayOfWeek",
            Column::Month => "Month",
            Column::Year => "Year",
            Column::Day => "Day",
            Column::DayOfWeekIndex => "DayOfWeekIndex",
            Column::Comments => "Comments",
        }
    }

    /// Match a header cell against the canonical columns
    pub fn from_header(header: &str) -> Option<Column> {
        let wanted = normalize(header);
        if wanted.is_empty() {
            return None;
        }
        Column::ALL
            .into_iter()
            .find(|column| normalize(column.name()) == wanted)
    }

    /// Calendar attributes computed from the date
    pub fn is_derived(self) -> bool {
        matches!(
            self,
            Column::DayOfWeek
                | Column::Month
                | Column::Year
                | Column::Day
                | Column::DayOfWeekIndex
        )
    }
}

fn normalize(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Canonical header row
pub fn canonical_headers() -> Vec<String> {
    Column::ALL.iter().map(|c| c.name().to_string()).collect()
}

impl Record {
    /// Counter field behind `column`, if it is a counter
    pub fn counter_mut(&mut self, column: Column) -> Option<&mut Option<u64>> {
        let slot = match column {
            Column::DoorCount => &mut self.door_count,
            Column::CheckedOut => &mut self.checked_out,
            Column::TotalSelfCheck => &mut self.total_self_check,
            Column::DeskCheckOut => &mut self.desk_check_out,
            Column::Renewed => &mut self.renewed,
            Column::TotalCheckedIn => &mut self.total_checked_in,
            Column::TotalCheckedOutReporting => &mut self.total_checked_out_reporting,
            Column::Holds => &mut self.holds,
            Column::NewPatrons => &mut self.new_patrons,
            Column::NewCantonPatrons => &mut self.new_canton_patrons,
            Column::CurbAppt => &mut self.curb_appt,
            Column::IllLent => &mut self.ill_lent,
            Column::IllBorrowed => &mut self.ill_borrowed,
            _ => return None,
        };
        Some(slot)
    }

    fn counter(&self, column: Column) -> Option<u64> {
        match column {
            Column::DoorCount => self.door_count,
            Column::CheckedOut => self.checked_out,
            Column::TotalSelfCheck => self.total_self_check,
            Column::DeskCheckOut => self.desk_check_out,
            Column::Renewed => self.renewed,
            Column::TotalCheckedIn => self.total_checked_in,
            Column::TotalCheckedOutReporting => self.total_checked_out_reporting,
            Column::Holds => self.holds,
            Column::NewPatrons => self.new_patrons,
            Column::NewCantonPatrons => self.new_canton_patrons,
            Column::CurbAppt => self.curb_appt,
            Column::IllLent => self.ill_lent,
            Column::IllBorrowed => self.ill_borrowed,
            _ => None,
        }
    }

    /// Text of this record's cell in `column`; unset values are empty
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Id => self.id.map(|id| id.to_string()).unwrap_or_default(),
            Column::Date => self.date.format(DATE_FORMAT).to_string(),
            Column::DayOfWeek => self.day_of_week(),
            Column::Month => self.month(),
            Column::Year => self.year().to_string(),
            Column::Day => self.day().to_string(),
            Column::DayOfWeekIndex => self.day_of_week_index().to_string(),
            Column::Comments => self.comments.clone().unwrap_or_default(),
            counter => self
                .counter(counter)
                .map(|value| value.to_string())
                .unwrap_or_default(),
        }
    }

    /// Cells in the order of `columns`; unknown columns stay empty
    pub fn cells(&self, columns: &[Option<Column>]) -> Vec<String> {
        columns
            .iter()
            .map(|column| column.map(|c| self.cell(c)).unwrap_or_default())
            .collect()
    }
}
