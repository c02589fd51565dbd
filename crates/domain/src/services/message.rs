//! Telegram message templates.
//!
//! Messages use Telegram's HTML parse mode. Every interpolated value goes
//! through [`escape`] so user-entered text can't break the markup.

use chrono::{DateTime, Utc};
use shared::html::escape;

use crate::models::notification::NotificationKind;
use crate::models::task::Task;

use super::notification::NotificationPayload;

const MISSING: &str = "Н/Д";
const DEFAULT_CREATOR: &str = "Система";
const DEFAULT_COMPANY: &str = "ДТС";

/// Title, banner and call to action of a task notification.
struct TaskTemplate {
    title: &'static str,
    banner: &'static str,
    footer: &'static str,
}

fn task_template(kind: NotificationKind) -> Option<TaskTemplate> {
    let template = match kind {
        NotificationKind::NewRequests => TaskTemplate {
            title: "Нові заявки",
            banner: "✅ <b>🆕 НОВА ЗАЯВКА СТВОРЕНА</b>",
            footer: "💡 <b>Дія:</b> Необхідно розглянути та призначити виконавця",
        },
        NotificationKind::PendingApproval => TaskTemplate {
            title: "Потребує підтвердження Завсклада",
            banner: "🔔 <b>⚠️ ЗАЯВКА ВИКОНАНА ТА ПОТРЕБУЄ ЗАТВЕРДЖЕННЯ ЗАВ. СКЛАДА</b>",
            footer: "💡 <b>Дія:</b> Необхідно розглянути та підтвердити заявку",
        },
        NotificationKind::AccountantApproval => TaskTemplate {
            title: "Затвердження Бухгалтера",
            banner: "🔔 <b>⚠️ ЗАЯВКА ВИКОНАНА ТА ПОТРЕБУЄ ЗАТВЕРДЖЕННЯ БУХГАЛТЕРА</b>",
            footer: "💡 <b>Дія:</b> Необхідно розглянути та підтвердити заявку",
        },
        NotificationKind::ApprovedRequests => TaskTemplate {
            title: "Підтверджені заявки",
            banner: "✅ <b>✅ ВАША ЗАЯВКА ЗАТВЕРДЖЕНА ТА НАЧИСЛЕНА ПРЕМІЯ ЗА ВИКОНАНУ ЗАЯВКУ</b>",
            footer: "🎉 <b>Заявка готова до оплати</b>",
        },
        NotificationKind::RejectedRequests => TaskTemplate {
            title: "Відхилені заявки",
            banner: "❌ <b>❌ ВІДХИЛЕНО</b>",
            footer: "⚠️ <b>Необхідно виправити зауваження</b>",
        },
        _ => return None,
    };
    Some(template)
}

/// Formats the message for `kind` using the current time.
pub fn format_message(kind: NotificationKind, payload: &NotificationPayload) -> String {
    format_message_at(kind, payload, Utc::now())
}

/// Formats the message for `kind`; `now` fills the date fallbacks. Never fails.
pub fn format_message_at(
    kind: NotificationKind,
    payload: &NotificationPayload,
    now: DateTime<Utc>,
) -> String {
    match kind {
        NotificationKind::InvoiceRequests => invoice_requested(payload),
        NotificationKind::CompletedInvoices => invoice_completed(payload),
        NotificationKind::SystemNotifications => system_message(payload, now),
        _ => match (payload.task.as_ref(), task_template(kind)) {
            (Some(task), Some(template)) => format!(
                "{}\n\n{}\n\n{}",
                task_card(template.title, task, now),
                template.banner,
                template.footer
            ),
            (task, _) => status_update(task, payload, now),
        },
    }
}

/// Generic card used when a task event arrives without its task.
fn status_update(task: Option<&Task>, payload: &NotificationPayload, now: DateTime<Utc>) -> String {
    let card = match task {
        Some(task) => task_card("Оновлення заявки", task, now),
        None => {
            let mut placeholder = Task::new(uuid::Uuid::nil());
            placeholder.request_number = payload
                .data
                .request_number
                .clone()
                .or_else(|| payload.data.task_id.clone());
            placeholder.company = payload.data.company_name.clone();
            placeholder.edrpou = payload.data.edrpou.clone();
            task_card("Оновлення заявки", &placeholder, now)
        }
    };
    format!("{}\n📢 <b>📝 ОНОВЛЕННЯ СТАТУСУ</b>", card)
}

fn task_card(title: &str, task: &Task, now: DateTime<Utc>) -> String {
    let request_number = first_present(&[task.request_number.as_deref()])
        .map(escape)
        .unwrap_or_else(|| {
            if task.id.is_nil() {
                MISSING.to_string()
            } else {
                task.id.to_string()
            }
        });
    let creator = first_present(&[task.created_by.as_deref(), task.engineer1.as_deref()])
        .unwrap_or(DEFAULT_CREATOR);
    let request_date = task
        .request_date
        .unwrap_or_else(|| now.date_naive())
        .format("%Y-%m-%d");

    format!(
        "🔔 <b>Сповіщення про заявку</b>\n\
         📌 <b>Тип сповіщення: {title}</b>\n\n\
         📋 <b>Номер заявки:</b> {request_number}\n\
         👤 <b>Хто створив:</b> {creator}\n\
         📊 <b>Статус заявки:</b> {status}\n\
         📅 <b>Дата заявки:</b> {request_date}\n\
         🏢 <b>Компанія виконавець:</b> {company}\n\
         📍 <b>Регіон сервісного відділу:</b> {region}\n\
         📝 <b>Опис заявки:</b> {desc}\n\
         🏛️ <b>ЄДРПОУ:</b> {edrpou}\n\
         👥 <b>Замовник:</b> {client}\n\
         🧾 <b>Номер рахунку:</b> {invoice}\n\
         🏠 <b>Адреса:</b> {address}\n\
         ⚙️ <b>Тип обладнання:</b> {equipment}",
        title = title,
        request_number = request_number,
        creator = escape(creator),
        status = escape(task.status.as_str()),
        request_date = request_date,
        company = escape(first_present(&[task.company.as_deref()]).unwrap_or(DEFAULT_COMPANY)),
        region = or_missing(task.service_region.as_deref()),
        desc = or_missing(task.request_desc.as_deref()),
        edrpou = or_missing(task.edrpou.as_deref()),
        client = or_missing(task.client.as_deref()),
        invoice = or_missing(task.invoice.as_deref()),
        address = or_missing(task.address.as_deref()),
        equipment = or_missing(task.equipment.as_deref()),
    )
}

fn invoice_requested(payload: &NotificationPayload) -> String {
    let data = &payload.data;
    format!(
        "🔔 <b>Сповіщення про заявку</b>\n\
         📌 <b>Тип сповіщення: Запити на рахунки</b>\n\n\
         📄 <b>Новий запит на рахунок</b>\n\n\
         🏢 <b>Компанія:</b> {}\n\
         🏛️ <b>ЄДРПОУ:</b> {}\n\
         👤 <b>Запитувач:</b> {}\n\
         📋 <b>Номер заявки:</b> {}\n\n\
         ⏳ <b>Очікує обробки бухгалтером</b>",
        or_missing(data.company_name.as_deref()),
        or_missing(data.edrpou.as_deref()),
        or_missing(data.requester_name.as_deref()),
        or_missing(first_present(&[data.request_number.as_deref(), data.task_id.as_deref()])),
    )
}

fn invoice_completed(payload: &NotificationPayload) -> String {
    let data = &payload.data;
    format!(
        "🔔 <b>Сповіщення про заявку</b>\n\
         📌 <b>Тип сповіщення: Виконані рахунки</b>\n\n\
         ✅ <b>Рахунок готовий</b>\n\n\
         🏢 <b>Компанія:</b> {}\n\
         📋 <b>ID заявки:</b> {}\n\
         👤 <b>Для користувача:</b> {}\n\n\
         📥 <b>Файл рахунку завантажено</b>\n\
         💡 <b>Можете завантажити файл в системі</b>",
        or_missing(data.company_name.as_deref()),
        or_missing(data.task_id.as_deref()),
        or_missing(data.requester_id.as_deref()),
    )
}

fn system_message(payload: &NotificationPayload, now: DateTime<Utc>) -> String {
    format!(
        "🌸💕 <b>СИСТЕМНЕ ПОВІДОМЛЕННЯ</b> 💕🌸\n\n\
         🔔 <b>Повідомлення від адміністратора:</b>\n\
         {}\n\n\
         📅 <b>Час відправки:</b> {}\n\n\
         🌸💕 <b>ВАЖЛИВО!</b> 💕🌸",
        or_missing(payload.data.message.as_deref()),
        now.format("%d.%m.%Y, %H:%M:%S UTC"),
    )
}

/// First value that is non-blank after trimming.
fn first_present<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
}

fn or_missing(value: Option<&str>) -> String {
    escape(first_present(&[value]).unwrap_or(MISSING))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;
    use chrono::{NaiveDate, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
    }

    fn sample_task() -> Task {
        let mut task = Task::new(Uuid::new_v4());
        task.request_number = Some("KV-0042".into());
        task.request_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        task.status = TaskStatus::Done;
        task.service_region = Some("Київський".into());
        task.client = Some("ТОВ \"Ромашка\"".into());
        task.created_by = Some("ivan".into());
        task
    }

    #[test]
    fn test_new_request_card() {
        let payload = NotificationPayload::for_task(sample_task(), None);
        let text = format_message_at(NotificationKind::NewRequests, &payload, now());

        assert!(text.contains("Тип сповіщення: Нові заявки"));
        assert!(text.contains("📋 <b>Номер заявки:</b> KV-0042"));
        assert!(text.contains("👤 <b>Хто створив:</b> ivan"));
        assert!(text.contains("📊 <b>Статус заявки:</b> Виконано"));
        assert!(text.contains("📅 <b>Дата заявки:</b> 2024-03-01"));
        assert!(text.contains("🏢 <b>Компанія виконавець:</b> ДТС"));
        assert!(text.contains("🏠 <b>Адреса:</b> Н/Д"));
        assert!(text.contains("НОВА ЗАЯВКА СТВОРЕНА"));
    }

    #[test]
    fn test_values_are_escaped() {
        let payload = NotificationPayload::for_task(sample_task(), None);
        let text = format_message_at(NotificationKind::RejectedRequests, &payload, now());
        assert!(text.contains("ТОВ &quot;Ромашка&quot;"));
        assert!(text.contains("ВІДХИЛЕНО"));
    }

    #[test]
    fn test_card_fallbacks() {
        let mut task = Task::new(Uuid::new_v4());
        task.engineer1 = Some("Петренко".into());
        let id = task.id;
        let payload = NotificationPayload::for_task(task, None);
        let text = format_message_at(NotificationKind::PendingApproval, &payload, now());

        assert!(text.contains(&format!("📋 <b>Номер заявки:</b> {}", id)));
        assert!(text.contains("👤 <b>Хто створив:</b> Петренко"));
        assert!(text.contains("📊 <b>Статус заявки:</b> Заявка"));
        assert!(text.contains("📅 <b>Дата заявки:</b> 2024-03-15"));
        assert!(text.contains("ЗАТВЕРДЖЕННЯ ЗАВ. СКЛАДА"));
    }

    #[test]
    fn test_each_task_kind_has_its_banner() {
        let payload = NotificationPayload::for_task(sample_task(), None);
        let cases = [
            (NotificationKind::AccountantApproval, "ЗАТВЕРДЖЕННЯ БУХГАЛТЕРА"),
            (NotificationKind::ApprovedRequests, "НАЧИСЛЕНА ПРЕМІЯ"),
            (NotificationKind::RejectedRequests, "ВІДХИЛЕНО"),
        ];
        for (kind, banner) in cases {
            assert!(format_message_at(kind, &payload, now()).contains(banner));
        }
    }

    #[test]
    fn test_invoice_requested() {
        let mut payload = NotificationPayload::default();
        payload.data.company_name = Some("ТОВ <Альфа>".into());
        payload.data.edrpou = Some("12345678".into());
        payload.data.requester_name = Some("Іван".into());
        payload.data.task_id = Some("abc".into());

        let text = format_message_at(NotificationKind::InvoiceRequests, &payload, now());
        assert!(text.contains("Запити на рахунки"));
        assert!(text.contains("ТОВ &lt;Альфа&gt;"));
        assert!(text.contains("📋 <b>Номер заявки:</b> abc"));
    }

    #[test]
    fn test_invoice_completed_missing_fields() {
        let text = format_message_at(
            NotificationKind::CompletedInvoices,
            &NotificationPayload::default(),
            now(),
        );
        assert!(text.contains("Рахунок готовий"));
        assert!(text.contains("📋 <b>ID заявки:</b> Н/Д"));
    }

    #[test]
    fn test_system_message() {
        let payload = NotificationPayload::system_message("Сервер <оновлено>", None);
        let text = format_message_at(NotificationKind::SystemNotifications, &payload, now());
        assert!(text.contains("СИСТЕМНЕ ПОВІДОМЛЕННЯ"));
        assert!(text.contains("Сервер &lt;оновлено&gt;"));
        assert!(text.contains("15.03.2024, 09:30:00"));
    }

    #[test]
    fn test_task_kind_without_task_falls_back() {
        let mut payload = NotificationPayload::default();
        payload.data.request_number = Some("KV-7".into());
        let text = format_message_at(NotificationKind::ApprovedRequests, &payload, now());
        assert!(text.contains("ОНОВЛЕННЯ СТАТУСУ"));
        assert!(text.contains("📋 <b>Номер заявки:</b> KV-7"));
    }
}
