// src/main.rs
use std::collections::BTreeMap;
use std::path::PathBuf;

use iced::widget::{column, container};
use iced::{executor, window, Application, Command, Element, Length, Theme};
use rfd::FileDialog;

mod cloud_handler;
mod csv_handler;
mod data_types;
mod error;
mod extract;
mod insight_handler;
mod sample_data;
mod state;
mod store;
mod ui;
mod views;

use cloud_handler::CloudHandler;
use csv_handler::CSVHandler;
use data_types::TableData;
use error::FetchError;
use insight_handler::InsightHandler;
use state::{AppState, FetchRequest};
use store::Store;
use ui::{Styles, DARK_THEME, LIGHT_THEME};
use views::SettingsDraft;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    Sheetbase::run(iced::Settings {
        window: window::Settings {
            size: (1024, 768),
            resizable: true,
            ..Default::default()
        },
        ..iced::Settings::default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Home,
    Watchlist,
    Settings,
}

struct Sheetbase {
    state: AppState,
    cloud: CloudHandler,
    insights: InsightHandler,
    is_dark_mode: bool,
    page: Page,
    selected_table: Option<String>,
    insight_text: BTreeMap<String, String>,
    insight_pending: Option<String>,
    notice: Option<String>,
    draft: SettingsDraft,
}

#[derive(Debug, Clone)]
enum Message {
    Navigate(Page),
    ToggleTheme,
    Refresh,
    DataLoaded(Result<TableData, FetchError>),
    SelectTable(String),
    GenerateInsights,
    InsightsReady(String, String),
    ExportTable,
    ExportFinished(Result<Option<PathBuf>, String>),
    SourceIdChanged(String),
    CredentialChanged(String),
    TableNameChanged(usize, String),
    ColumnsChanged(usize, String),
    AddTable,
    RemoveTable(usize),
    SaveSettings,
}

impl Application for Sheetbase {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = ();

    fn new(_flags: ()) -> (Self, Command<Message>) {
        let store = Store::open_default();
        log::info!("Using storage directory {}", store.dir().display());

        let state = AppState::new(store);
        let draft = SettingsDraft::from_settings(state.settings());

        let mut app = Sheetbase {
            state,
            cloud: CloudHandler::new(),
            insights: InsightHandler::from_env(),
            is_dark_mode: true,
            page: Page::Home,
            selected_table: None,
            insight_text: BTreeMap::new(),
            insight_pending: None,
            notice: None,
            draft,
        };
        let command = app.start_refresh();
        (app, command)
    }

    fn title(&self) -> String {
        format!("Sheetbase v{}", VERSION)
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::Navigate(page) => {
                if page == Page::Settings {
                    self.draft = SettingsDraft::from_settings(self.state.settings());
                }
                self.page = page;
                Command::none()
            }

            Message::ToggleTheme => {
                self.is_dark_mode = !self.is_dark_mode;
                Command::none()
            }

            Message::Refresh => {
                self.notice = None;
                self.start_refresh()
            }

            Message::DataLoaded(result) => {
                self.state.finish_refresh(result);
                self.ensure_selection();
                Command::none()
            }

            Message::SelectTable(name) => {
                self.selected_table = Some(name);
                Command::none()
            }

            Message::GenerateInsights => {
                let Some(table) = self.selected_table.clone() else {
                    return Command::none();
                };
                let rows = self.state.table_data().get(&table).cloned().unwrap_or_default();
                let insights = self.insights.clone();
                self.insight_pending = Some(table.clone());

                Command::perform(
                    async move {
                        let text = insights.generate(&table, &rows).await;
                        (table, text)
                    },
                    |(table, text)| Message::InsightsReady(table, text),
                )
            }

            Message::InsightsReady(table, text) => {
                if self.insight_pending.as_deref() == Some(table.as_str()) {
                    self.insight_pending = None;
                }
                self.insight_text.insert(table, text);
                Command::none()
            }

            Message::ExportTable => {
                let Some(table) = self.selected_table.clone() else {
                    return Command::none();
                };
                let rows = self.state.table_data().get(&table).cloned().unwrap_or_default();

                Command::perform(
                    async move {
                        let file_name = format!("{}.csv", table);
                        let Some(path) = FileDialog::new()
                            .add_filter("CSV Files", &["csv"])
                            .set_file_name(&file_name)
                            .save_file()
                        else {
                            return Ok(None);
                        };
                        CSVHandler::new()
                            .write_table(&path, &rows)
                            .map(|_| Some(path))
                            .map_err(|e| e.to_string())
                    },
                    Message::ExportFinished,
                )
            }

            Message::ExportFinished(result) => {
                match result {
                    Ok(Some(path)) => {
                        self.notice = Some(format!("Exported to {}", path.display()));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        log::warn!("CSV export failed: {}", e);
                        self.notice = Some(format!("Export failed: {}", e));
                    }
                }
                Command::none()
            }

            Message::SourceIdChanged(value) => {
                self.draft.source_id = value;
                Command::none()
            }

            Message::CredentialChanged(value) => {
                self.draft.credential = value;
                Command::none()
            }

            Message::TableNameChanged(index, value) => {
                if let Some(table) = self.draft.tables.get_mut(index) {
                    table.name = value;
                }
                Command::none()
            }

            Message::ColumnsChanged(index, value) => {
                if let Some(table) = self.draft.tables.get_mut(index) {
                    table.columns = value;
                }
                Command::none()
            }

            Message::AddTable => {
                self.draft.tables.push(Default::default());
                Command::none()
            }

            Message::RemoveTable(index) => {
                if index < self.draft.tables.len() {
                    self.draft.tables.remove(index);
                }
                Command::none()
            }

            Message::SaveSettings => {
                let request = self.state.apply_settings(self.draft.to_settings());
                self.draft = SettingsDraft::from_settings(self.state.settings());
                self.insight_text.clear();
                self.notice = Some("Settings saved".to_string());
                self.page = Page::Home;
                self.ensure_selection();
                self.perform_fetch(request)
            }
        }
    }

    fn view(&self) -> Element<Message> {
        let content = match self.page {
            Page::Home => views::home(self),
            Page::Watchlist => views::watchlist(self),
            Page::Settings => views::settings(self),
        };

        let main_content = column![
            views::nav(self),
            container(content)
                .width(Length::Fill)
                .height(Length::Fill)
                .padding(16),
            views::footer(self),
        ];

        container(main_content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn theme(&self) -> Theme {
        self.styles().theme.clone()
    }
}

impl Sheetbase {
    fn styles(&self) -> &'static Styles {
        if self.is_dark_mode {
            &DARK_THEME
        } else {
            &LIGHT_THEME
        }
    }

    fn start_refresh(&mut self) -> Command<Message> {
        let request = self.state.begin_refresh();
        self.ensure_selection();
        self.perform_fetch(request)
    }

    fn perform_fetch(&self, request: Option<FetchRequest>) -> Command<Message> {
        let Some(request) = request else {
            return Command::none();
        };
        let cloud = self.cloud.clone();

        Command::perform(
            async move {
                cloud
                    .fetch_tables(&request.source_id, &request.credential, &request.schema)
                    .await
            },
            Message::DataLoaded,
        )
    }

    /// Keeps the selected table pointing at something that exists.
    fn ensure_selection(&mut self) {
        let data = self.state.table_data();
        let still_there = self
            .selected_table
            .as_ref()
            .map_or(false, |name| data.contains_key(name));
        if !still_there {
            self.selected_table = data.keys().next().cloned();
        }
    }
}
