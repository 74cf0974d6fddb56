// src/views.rs
use iced::widget::{
    button, column, container, horizontal_space, row, scrollable, text, text_input, Column, Row as GridRow,
};
use iced::{Alignment, Element, Length};

use crate::data_types::{collect_headers, Row, Settings, TableSpec};
use crate::state::MASTER_TABLE;
use crate::{Message, Page, Sheetbase, VERSION};

/// Editable copy of the settings; columns are typed comma-separated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsDraft {
    pub source_id: String,
    pub credential: String,
    pub tables: Vec<TableDraft>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDraft {
    pub name: String,
    pub columns: String,
}

impl SettingsDraft {
    pub fn from_settings(settings: &Settings) -> Self {
        SettingsDraft {
            source_id: settings.source_id.clone(),
            credential: settings.credential.clone(),
            tables: settings
                .schema
                .iter()
                .map(|spec| TableDraft {
                    name: spec.table_name.clone(),
                    columns: spec.columns.join(", "),
                })
                .collect(),
        }
    }

    /// Blank table names are dropped, as are blank column entries.
    pub fn to_settings(&self) -> Settings {
        Settings {
            source_id: self.source_id.trim().to_string(),
            credential: self.credential.trim().to_string(),
            schema: self
                .tables
                .iter()
                .filter(|t| !t.name.trim().is_empty())
                .map(|t| TableSpec {
                    table_name: t.name.trim().to_string(),
                    columns: t
                        .columns
                        .split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(String::from)
                        .collect(),
                })
                .collect(),
        }
    }
}

pub fn nav(app: &Sheetbase) -> Element<Message> {
    let tab = |label: &'static str, page: Page| {
        let mut b = button(text(label).size(16)).padding([6, 14]);
        if app.page != page {
            b = b.on_press(Message::Navigate(page));
        }
        b
    };

    row![
        text("Sheetbase").size(22).style(app.styles().accent),
        horizontal_space(Length::Fill),
        tab("Home", Page::Home),
        tab("Watchlist", Page::Watchlist),
        tab("Settings", Page::Settings),
    ]
    .spacing(8)
    .padding(10)
    .align_items(Alignment::Center)
    .into()
}

pub fn footer(app: &Sheetbase) -> Element<Message> {
    let styles = app.styles();
    let status = if app.state.is_connected() {
        text("Connected to Google Sheets").style(styles.connected)
    } else {
        text("Offline: sample data").style(styles.muted)
    };

    row![
        text(format!("Sheetbase v{}", VERSION)).size(14).style(styles.muted),
        horizontal_space(Length::Fill),
        status.size(14),
        button(text("💡").size(16)).on_press(Message::ToggleTheme),
    ]
    .spacing(10)
    .padding(10)
    .align_items(Alignment::Center)
    .into()
}

pub fn home(app: &Sheetbase) -> Element<Message> {
    let styles = app.styles();
    let state = &app.state;

    let mut refresh = button(text("Refresh").size(14));
    if !state.is_loading() {
        refresh = refresh.on_press(Message::Refresh);
    }

    let mut status = column![].spacing(4);
    if state.is_loading() {
        status = status.push(text("Loading sheets…").style(styles.muted));
    }
    if let Some(error) = state.error() {
        status = status.push(text(format!("Error: {}", error)).style(styles.error));
    }
    if state.is_using_fallback() {
        status = status.push(
            text("Showing sample data. Add a sheet id and API key in Settings to load your own.")
                .style(styles.notice),
        );
    }
    if let Some(notice) = &app.notice {
        status = status.push(text(notice).style(styles.muted));
    }

    let tabs: Vec<Element<Message>> = state
        .table_data()
        .keys()
        .map(|name| {
            let mut b = button(text(name).size(14)).padding([4, 10]);
            if app.selected_table.as_deref() != Some(name.as_str()) {
                b = b.on_press(Message::SelectTable(name.clone()));
            }
            b.into()
        })
        .collect();

    let mut content = column![
        row![text("Dashboard").size(26), horizontal_space(Length::Fill), refresh]
            .align_items(Alignment::Center),
        status,
        scrollable(GridRow::with_children(tabs).spacing(6)).direction(
            scrollable::Direction::Horizontal(scrollable::Properties::default())
        ),
    ]
    .spacing(12);

    if let Some(name) = &app.selected_table {
        let rows = state.table_data().get(name).map(Vec::as_slice).unwrap_or(&[]);

        let mut insight_button = button(text("Generate insights").size(14));
        if app.insight_pending.is_none() && !rows.is_empty() {
            insight_button = insight_button.on_press(Message::GenerateInsights);
        }
        let mut export_button = button(text("Export CSV").size(14));
        if !rows.is_empty() {
            export_button = export_button.on_press(Message::ExportTable);
        }

        content = content.push(
            row![
                text(format!("{} ({} rows)", name, rows.len())).size(18),
                horizontal_space(Length::Fill),
                insight_button,
                export_button,
            ]
            .spacing(8)
            .align_items(Alignment::Center),
        );

        if app.insight_pending.as_deref() == Some(name.as_str()) {
            content = content.push(text("Generating insights…").style(styles.muted));
        } else if let Some(insight) = app.insight_text.get(name) {
            content = content.push(text(insight).size(14));
        }

        content = content.push(table_grid(rows));
    }

    scrollable(content).height(Length::Fill).into()
}

pub fn watchlist(app: &Sheetbase) -> Element<Message> {
    let styles = app.styles();
    let entries = app.state.watchlist();

    let mut list = column![
        text("Watchlist").size(26),
        text(format!("{} symbols from {}", entries.len(), MASTER_TABLE)).style(styles.muted),
    ]
    .spacing(10);

    if entries.is_empty() {
        list = list.push(text("Nothing on the watchlist yet.").style(styles.muted));
    }

    for entry in entries {
        let details = entry
            .data
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect::<Vec<_>>()
            .join("  ·  ");

        list = list.push(
            column![
                text(&entry.id).size(18).style(styles.accent),
                text(details).size(14),
            ]
            .spacing(2),
        );
    }

    scrollable(list).height(Length::Fill).into()
}

pub fn settings(app: &Sheetbase) -> Element<Message> {
    let styles = app.styles();
    let draft = &app.draft;

    let mut tables = column![].spacing(6);
    for (i, table) in draft.tables.iter().enumerate() {
        tables = tables.push(
            row![
                text_input("Sheet name", &table.name)
                    .on_input(move |v| Message::TableNameChanged(i, v))
                    .padding(6)
                    .width(Length::Fixed(200.0)),
                text_input("Columns (comma separated, empty = all)", &table.columns)
                    .on_input(move |v| Message::ColumnsChanged(i, v))
                    .padding(6)
                    .width(Length::Fill),
                button(text("Remove").size(14)).on_press(Message::RemoveTable(i)),
            ]
            .spacing(6)
            .align_items(Alignment::Center),
        );
    }

    let form = column![
        text("Settings").size(26),
        text("Google Sheet ID or URL:").size(16),
        text_input("Enter Google Sheet ID", &draft.source_id)
            .on_input(Message::SourceIdChanged)
            .padding(8)
            .width(Length::Fixed(500.0)),
        text("API key:").size(16),
        text_input("Enter Google API key", &draft.credential)
            .on_input(Message::CredentialChanged)
            .password()
            .padding(8)
            .width(Length::Fixed(500.0)),
        text("Tables").size(20),
        text("Each table is read from the sheet tab with the same name.").style(styles.muted),
        tables,
        row![
            button(text("Add table").size(14)).on_press(Message::AddTable),
            button(text("Save & refresh").size(14)).on_press(Message::SaveSettings),
        ]
        .spacing(8),
    ]
    .spacing(10);

    scrollable(form).height(Length::Fill).into()
}

fn table_grid(rows: &[Row]) -> Element<Message> {
    if rows.is_empty() {
        return text("This sheet has no rows.").into();
    }

    let headers = collect_headers(rows);

    let header_row = GridRow::with_children(
        headers.iter().map(|h| cell(h.clone(), 16)).collect(),
    )
    .spacing(1);

    let body: Vec<Element<Message>> = rows
        .iter()
        .map(|r| {
            GridRow::with_children(
                headers
                    .iter()
                    .map(|h| cell(r.get(h).map(|v| v.to_string()).unwrap_or_default(), 14))
                    .collect(),
            )
            .spacing(1)
            .into()
        })
        .collect();

    scrollable(column![header_row, Column::with_children(body).spacing(1)])
        .direction(scrollable::Direction::Horizontal(scrollable::Properties::default()))
        .into()
}

fn cell<'a>(value: String, size: u16) -> Element<'a, Message> {
    container(text(value).size(size))
        .width(Length::Fixed(140.0))
        .padding(5)
        .into()
}
