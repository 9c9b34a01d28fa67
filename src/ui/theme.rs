use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for the CLI's status lines
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub icon: Style,
    pub label: Style,
}

impl Theme {
    /// Colors only when stdout is a terminal and NO_COLOR is unset
    pub fn detect() -> Self {
        let colors = console::Term::stdout().is_term() && std::env::var_os("NO_COLOR").is_none();
        if colors { Self::colored() } else { Self::default() }
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            icon: Style::new().magenta(),
            label: Style::new().dimmed(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
