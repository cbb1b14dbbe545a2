//! Command parsing for the relay bot

/// Slash command sent by an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Help,
    Cancel,
    AddChannel,
    RemoveChannel,
    ListChannels,
    AddRate,
    RemoveRate,
    EditRate,
    ListRates,
}

impl Command {
    /// Parse a command; anything else (including unknown commands) is `None`
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let body = input.strip_prefix('/')?;

        // "/list@relay_bot extra" -> "list"
        let word = body.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word).to_lowercase();

        let command = match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "cancel" => Command::Cancel,
            "add_channel" => Command::AddChannel,
            "remove_channel" => Command::RemoveChannel,
            "list" | "channels" => Command::ListChannels,
            "add_rate" => Command::AddRate,
            "remove_rate" => Command::RemoveRate,
            "edit_rate" => Command::EditRate,
            "rates" => Command::ListRates,
            _ => return None,
        };
        Some(command)
    }

    /// Management commands reserved for administrators
    pub fn is_admin_only(&self) -> bool {
        !matches!(self, Command::Start | Command::Help | Command::Cancel)
    }

    /// Get help text for all commands
    pub fn help_text() -> &'static str {
        "<b>Конвертація цін</b>\n\
         Надішліть фото або альбом з підписом, що містить ціни у $.\n\
         Далі оберіть курс, за потреби відредагуйте текст і надішліть у канали.\n\n\
         <b>Канали</b>\n\
         /add_channel - додати канал\n\
         /remove_channel - видалити канал\n\
         /list - список каналів\n\n\
         <b>Курси</b>\n\
         /add_rate - додати курс\n\
         /edit_rate - змінити курс\n\
         /remove_rate - видалити курс\n\
         /rates - список курсів\n\n\
         /cancel - скасувати поточну дію"
    }
}
