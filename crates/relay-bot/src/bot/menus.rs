//! Operator-facing texts and keyboards

use crate::bot::editor::Caption;
use crate::bot::token::Token;
use crate::error::RelayError;
use crate::interface::{InlineButton, InlineKeyboard, LineAction};
use crate::store::{Channel, CurrencyRate};

pub const GREETING: &str = "Введіть повідомлення, яке потрібно конвертувати 👇";
pub const PHOTOS_ONLY: &str = "Приймаються тільки картинки або альбоми з підписом.";
pub const CHOOSE_RATE: &str = "Оберіть курс 👇";
pub const NO_RATES: &str = "Немає збережених курсів. Додайте курс командою /add_rate";
pub const RATE_NOT_FOUND: &str = "Курс не знайдено";
pub const RATE_FETCH_FAILED: &str = "Помилка під час отримання курсу валют";
pub const CHOOSE_LINE: &str = "Виберіть рядок 👇";
pub const LINE_NOT_FOUND: &str = "Рядок не знайдено, оберіть ще раз 👇";
pub const ENTER_BOLD: &str = "Введіть слова, які треба виділити жирним 👇";
pub const ALBUM_MISSING: &str = "Альбом не знайдено у стані.";
pub const NO_CHANNELS: &str = "Список каналів порожній. Додайте канал командою /add_channel";
pub const SENT: &str = "Повідомлення надіслані";
pub const CANCELLED: &str = "Скасовано";
pub const USE_BUTTONS: &str = "Скористайтеся кнопками вище 👆 або /cancel";
pub const STALE_ACTION: &str = "Ця дія вже недоступна";
pub const ADMIN_ONLY: &str = "Команда доступна лише адміністраторам";
pub const STORAGE_FAILED: &str = "Помилка бази даних, спробуйте пізніше";

pub const ENTER_CHANNEL_ID: &str = "Введіть ID";
pub const CHANNEL_ADDED: &str = "Канал успішно додано";
pub const CHANNEL_EXISTS: &str = "Канал вже існує";
pub const CHANNEL_REMOVED: &str = "Канал успішно видалено";
pub const CHANNEL_NOT_FOUND: &str = "Канал не знайдено";
pub const CHANNEL_NOT_NUMERIC: &str = "Увага: ID не числовий, розсилка цей канал пропустить";

pub const ENTER_RATE_NAME: &str = "Введіть назву валюти (наприклад, USD)";
pub const BAD_RATE_NAME: &str = "Назва має містити від 1 до 32 символів, спробуйте ще раз";
pub const BAD_RATE_VALUE: &str = "Некоректне значення курсу, введіть додатне число (наприклад, 41.5)";
pub const RATE_REMOVED: &str = "Курс видалено";
pub const CHOOSE_RATE_TO_REMOVE: &str = "Оберіть курс для видалення 👇";
pub const CHOOSE_RATE_TO_EDIT: &str = "Оберіть курс для зміни 👇";

fn button(label: impl AsRef<str>, token: Token) -> InlineButton {
    InlineButton::new(label, token.to_string())
}

fn back_row() -> Vec<InlineButton> {
    vec![button("Назад", Token::Back)]
}

fn cancel_row() -> Vec<InlineButton> {
    vec![button("Скасувати", Token::Cancel)]
}

/// Escape text placed inside HTML markup
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Format a rate without trailing zeros
pub fn format_rate(rate: f64) -> String {
    format!("{rate}")
}

/// Edit / send menu under the converted caption
pub fn main_menu() -> InlineKeyboard {
    InlineKeyboard::grid(
        vec![
            button("Редагувати", Token::Edit),
            button("Надіслати в групи", Token::Send),
        ],
        2,
    )
    .with_row(cancel_row())
}

/// Editing tools
pub fn edit_menu() -> InlineKeyboard {
    InlineKeyboard::column(vec![
        button("Добавити перехід на новий рядок", Token::AddLine),
        button("Виділити жирним", Token::AddBold),
        button("Назад", Token::Back),
    ])
}

/// One button per caption line
pub fn line_picker(caption: &Caption, action: LineAction) -> InlineKeyboard {
    let buttons = caption
        .lines()
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let token = match action {
                // Insert below the chosen line
                LineAction::InsertBlank => Token::InsertAt(i + 1),
                LineAction::Bold => Token::BoldLine(i),
            };
            button(line, token)
        })
        .collect();

    InlineKeyboard::column(buttons).with_row(back_row())
}

/// Prompt shown once a line is picked for bolding
pub fn bold_prompt(line: &str) -> String {
    format!("{ENTER_BOLD}\n\n<code>{}</code>", escape_html(line))
}

/// Rates to convert with, plus the live bank rate when available
pub fn rate_picker(rates: &[CurrencyRate], live_rate: bool) -> InlineKeyboard {
    let mut buttons: Vec<InlineButton> = rates
        .iter()
        .map(|r| button(format!("{} — {}", r.name, format_rate(r.rate)), Token::Rate(r.id)))
        .collect();
    if live_rate {
        buttons.push(button("Курс ПриватБанку", Token::LiveRate));
    }

    InlineKeyboard::grid(buttons, 2).with_row(cancel_row())
}

/// Rates offered for removal or update
pub fn rate_admin_picker(rates: &[CurrencyRate], token: fn(i64) -> Token) -> InlineKeyboard {
    let buttons = rates
        .iter()
        .map(|r| button(format!("{} — {}", r.name, format_rate(r.rate)), token(r.id)))
        .collect();

    InlineKeyboard::column(buttons).with_row(cancel_row())
}

pub fn confirm_rate_menu() -> InlineKeyboard {
    InlineKeyboard::grid(
        vec![
            button("Зберегти", Token::ConfirmRate),
            button("Скасувати", Token::Cancel),
        ],
        2,
    )
}

pub fn rates_listing(rates: &[CurrencyRate]) -> String {
    if rates.is_empty() {
        return NO_RATES.to_string();
    }
    rates
        .iter()
        .map(|r| format!("{} — {}", escape_html(&r.name), format_rate(r.rate)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn rate_chosen(name: &str, rate: f64) -> String {
    format!("Курс {}: {}", escape_html(name), format_rate(rate))
}

pub fn rate_value_prompt(name: &str) -> String {
    format!("Введіть курс для {} 👇", escape_html(name))
}

pub fn confirm_rate_prompt(name: &str, rate: f64) -> String {
    format!("Зберегти курс {} — {}?", escape_html(name), format_rate(rate))
}

pub fn rate_added(name: &str) -> String {
    format!("Курс {} додано", escape_html(name))
}

pub fn rate_exists(name: &str) -> String {
    format!("Курс {} вже існує", escape_html(name))
}

pub fn rate_edit_prompt(rate: &CurrencyRate) -> String {
    format!(
        "Введіть новий курс для {} (зараз {}) 👇",
        escape_html(&rate.name),
        format_rate(rate.rate)
    )
}

pub fn rate_updated(rate: &CurrencyRate) -> String {
    format!("Курс {} оновлено: {}", escape_html(&rate.name), format_rate(rate.rate))
}

/// Per-channel broadcast problems
pub fn delivery_failed(identifier: &str, failure: &RelayError) -> String {
    format!(
        "Помилка надсилання до каналу {}\n<i>{}</i>",
        escape_html(identifier),
        escape_html(&failure.to_string())
    )
}

pub fn channel_missing(identifier: &str) -> String {
    format!("Канал {} не знайдено", escape_html(identifier))
}

pub fn channels_listing(channels: &[Channel]) -> String {
    if channels.is_empty() {
        return NO_CHANNELS.to_string();
    }
    channels
        .iter()
        .map(|c| escape_html(&c.identifier))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rate(id: i64, name: &str, value: f64) -> CurrencyRate {
        CurrencyRate {
            id,
            name: name.to_string(),
            rate: value,
            created: Utc::now(),
            updated: Utc::now(),
        }
    }

    #[test]
    fn test_line_picker_tokens() {
        let caption = Caption::from_text("a\nb");
        let insert = line_picker(&caption, LineAction::InsertBlank);
        assert_eq!(insert.tokens(), vec!["line_1", "line_2", "back"]);

        let bold = line_picker(&caption, LineAction::Bold);
        assert_eq!(bold.tokens(), vec!["add_bold_0", "add_bold_1", "back"]);
    }

    #[test]
    fn test_rate_picker_with_live_rate() {
        let rates = vec![rate(1, "USD", 40.0), rate(2, "EUR", 44.5)];
        let keyboard = rate_picker(&rates, true);
        assert_eq!(keyboard.tokens(), vec!["rate_1", "rate_2", "rate_live", "cancel"]);
        assert_eq!(keyboard.inline_keyboard[0][1].text, "EUR — 44.5");

        let keyboard = rate_picker(&rates, false);
        assert_eq!(keyboard.tokens(), vec!["rate_1", "rate_2", "cancel"]);
    }

    #[test]
    fn test_admin_picker_and_listing() {
        let rates = vec![rate(3, "USD", 41.25)];
        let keyboard = rate_admin_picker(&rates, Token::RemoveRate);
        assert_eq!(keyboard.tokens(), vec!["del_rate_3", "cancel"]);
        assert_eq!(rates_listing(&rates), "USD — 41.25");
        assert_eq!(rates_listing(&[]), NO_RATES);
    }

    #[test]
    fn test_bold_prompt_escapes_markup() {
        assert_eq!(
            bold_prompt("<b>Dress</b> & co"),
            format!("{ENTER_BOLD}\n\n<code>&lt;b&gt;Dress&lt;/b&gt; &amp; co</code>")
        );
    }

    #[test]
    fn test_delivery_failed_shows_reason() {
        let failure = RelayError::DeliveryFailure {
            channel: "-1002".to_string(),
            reason: "Bad Request: <chat> not found".to_string(),
        };
        assert_eq!(
            delivery_failed("-1002", &failure),
            "Помилка надсилання до каналу -1002\n\
             <i>Delivery to -1002 failed: Bad Request: &lt;chat&gt; not found</i>"
        );
    }
}
