use std::{env, path::PathBuf};

use buddy_config::{app_home_dir, Config, ConfigManager};
use buddy_core::{Clock, ExpenseService, FixedClock, ProfileStore, SystemClock};
use buddy_domain::{OwnerId, WindowPreset};
use buddy_storage_json::{FsAttachmentStore, JsonExpenseStore};
use chrono::NaiveDate;
use dialoguer::theme::ColorfulTheme;

use crate::errors::CliError;

use super::{commands, output, registry::CommandRegistry};

/// Pins "today" for scripted sessions, e.g. `BUDGET_BUDDY_TODAY=2024-03-31`.
pub const TODAY_ENV: &str = "BUDGET_BUDDY_TODAY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub home: PathBuf,
    pub data_root: PathBuf,
    pub receipts_dir: PathBuf,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub service: ExpenseService,
    pub profiles: Box<dyn ProfileStore>,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_home(mode, app_home_dir())
    }

    pub fn with_home(mode: CliMode, home: PathBuf) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config_manager = ConfigManager::with_base_dir(home.clone())?;
        let config = config_manager.load_or_init()?;
        output::apply_config(&config);

        let owner = config.owner_id.unwrap_or_default();
        let data_root = config.resolve_data_root(&home);
        let clock = clock_from_env()?;
        let attachments = FsAttachmentStore::with_clock(
            &data_root,
            config.attachment_base_url.clone(),
            clock_from_env()?,
        );
        let store = JsonExpenseStore::with_clock(data_root.clone(), clock_from_env()?)?;
        let receipts_dir = attachments.receipts_dir().to_path_buf();
        let data_root = store.root().to_path_buf();
        let service =
            ExpenseService::with_clock(owner, Box::new(store), Box::new(attachments), clock);
        let profiles = Box::new(JsonExpenseStore::new(data_root.clone())?);

        Ok(Self {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            home,
            data_root,
            receipts_dir,
            config_manager,
            config,
            service,
            profiles,
            last_command: None,
            running: true,
        })
    }

    pub fn owner(&self) -> OwnerId {
        self.service.owner()
    }

    pub fn today(&self) -> NaiveDate {
        self.service.today()
    }

    pub fn default_window(&self) -> WindowPreset {
        self.config.default_window
    }

    pub fn prompt(&self) -> String {
        "budget-buddy> ".to_string()
    }

    pub fn status(&self) -> String {
        format!(
            "ShellContext {{ running: {}, last_command: {:?}, owner: {} }}",
            self.running,
            self.last_command,
            self.owner()
        )
    }
}

fn clock_from_env() -> Result<Box<dyn Clock>, CliError> {
    match env::var(TODAY_ENV) {
        Ok(raw) => {
            let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                CliError::Input(format!("{TODAY_ENV} must be YYYY-MM-DD, got `{raw}`"))
            })?;
            Ok(Box::new(FixedClock::on(date)))
        }
        Err(_) => Ok(Box::new(SystemClock)),
    }
}
