use crate::models::{Configuration, Payment, ScheduleDay, ScheduleResponse, DAYS_OF_WEEK};

pub fn render_tracker(configuration: &Configuration, schedule: &ScheduleResponse) -> String {
    let days = if schedule.days.is_empty() {
        r#"<p class="empty">No training days since the last payment.</p>"#.to_string()
    } else {
        schedule
            .days
            .iter()
            .map(|day| render_day(day, configuration))
            .collect::<Vec<_>>()
            .join("\n")
    };

    TRACKER_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{MONEY_LEFT}}", &escape(&schedule.money_left))
        .replace("{{DAYS}}", &days)
        .replace(
            "{{LAST_PAYMENT}}",
            &escape(schedule.day_of_last_payment.as_deref().unwrap_or("")),
        )
}

fn render_day(day: &ScheduleDay, configuration: &Configuration) -> String {
    let weekday = match &day.moved_to_weekday {
        Some(moved) => format!(
            r#"<span class="struck">{}</span><span>{}</span>"#,
            escape(&day.weekday),
            escape(moved)
        ),
        None => format!("<span>{}</span>", escape(&day.weekday)),
    };
    let date = match day.payment.as_ref() {
        Some(Payment::Moved { moved_to, .. }) => format!(
            r#"<span class="struck">{}</span><span>{}</span>"#,
            escape(&day.day),
            escape(moved_to)
        ),
        _ => format!("<span>{}</span>", escape(&day.day)),
    };

    if day.is_paid {
        let message = day.message.as_deref().unwrap_or_default();
        return format!(
            r#"<div class="day paid">{weekday}{date}<p class="message">{}</p></div>"#,
            escape(message)
        );
    }

    let options = configuration
        .possible_payments
        .iter()
        .map(|option| {
            format!(
                r#"<option value="{}">{}: {}</option>"#,
                escape(&option.cost),
                escape(&option.name),
                escape(&option.cost)
            )
        })
        .collect::<Vec<_>>()
        .join("");

    format!(
        r#"<details class="day">
  <summary>{weekday}{date}</summary>
  <form method="post" action="/pay">
    <input type="hidden" name="day" value="{key}" />
    <label><input type="radio" name="type" value="skipped" /> Skipped</label>
    <label><input type="radio" name="type" value="payed" /> Payed</label>
    <label><input type="radio" name="type" value="moved" /> Moved to <input type="date" name="moved_to" /></label>
    <select name="value"><option value="">-</option>{options}</select>
    <button type="submit">Save</button>
  </form>
</details>"#,
        key = escape(&day.day),
    )
}

pub fn render_setup(configuration: &Configuration) -> String {
    let weekdays = DAYS_OF_WEEK
        .iter()
        .map(|label| {
            let checked = configuration
                .selected_days
                .0
                .get(*label)
                .copied()
                .unwrap_or(false);
            format!(
                r#"<label class="weekday"><input type="checkbox" name="day" value="{label}"{} /> {label}</label>"#,
                if checked { " checked" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let payments = configuration
        .possible_payments
        .iter()
        .map(|option| payment_row(&option.name, &option.cost))
        .collect::<Vec<_>>()
        .join("\n");

    SETUP_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{WEEKDAYS}}", &weekdays)
        .replace("{{TOTAL}}", &escape(&configuration.total_price))
        .replace("{{PAYMENTS}}", &payments)
        .replace("{{EMPTY_ROW}}", &payment_row("", ""))
}

fn payment_row(name: &str, cost: &str) -> String {
    format!(
        r#"<div class="payment"><input type="text" class="payment-name" value="{}" /> : <input type="number" class="payment-cost" value="{}" /><button type="button" class="remove">&times;</button></div>"#,
        escape(name),
        escape(cost)
    )
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const STYLE: &str = r#"
    :root {
      --bg: #15162c;
      --card: #155e75;
      --paid: #14532d;
      --ink: #ffffff;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px;
    }

    main {
      width: min(860px, 100%);
      display: grid;
      gap: 28px;
      justify-items: center;
    }

    h1 {
      font-size: clamp(2rem, 4vw, 3.2rem);
      margin: 0;
    }

    .days {
      display: flex;
      flex-wrap: wrap;
      gap: 16px;
    }

    .day {
      background: var(--card);
      border-radius: 12px;
      padding: 16px;
      text-align: center;
      font-size: 1.3rem;
    }

    .day span {
      display: block;
    }

    .day.paid {
      background: var(--paid);
    }

    .struck {
      text-decoration: line-through;
    }

    .message {
      font-size: 1rem;
      margin: 8px 0 0;
    }

    form {
      display: grid;
      gap: 8px;
      margin-top: 12px;
      font-size: 1rem;
    }

    button {
      border: none;
      border-radius: 8px;
      padding: 10px 16px;
      cursor: pointer;
      background: var(--card);
      color: var(--ink);
    }

    button.danger {
      background: #dc2626;
    }
"#;

const TRACKER_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Training Tracker</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main>
    <h1>Track your paid workouts</h1>
    <p class="money">Money left: {{MONEY_LEFT}}</p>
    <p>Your training days since last payment:</p>
    <div class="days">
{{DAYS}}
    </div>
    <form method="post" action="/last-payment">
      <label for="day-of-last-payment">Day of last payment:</label>
      <input type="date" id="day-of-last-payment" name="date" value="{{LAST_PAYMENT}}" />
      <button type="submit">Set</button>
    </form>
    <form method="post" action="/just-paid">
      <button type="submit">Just paid</button>
    </form>
    <a href="/setup"><button type="button">Edit configuration</button></a>
    <form method="post" action="/reset" onsubmit="return confirm('Reset configuration and all payments?');">
      <button type="submit" class="danger">Reset configuration</button>
    </form>
  </main>
</body>
</html>
"#;

const SETUP_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Training Tracker Setup</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main>
    <h1>Track your paid workouts</h1>
    <p>Select days of your trainings:</p>
    <div class="days">
{{WEEKDAYS}}
    </div>
    <label>Add total price: <input type="number" id="total-price" value="{{TOTAL}}" /></label>
    <p>Add possible payments:</p>
    <div id="payments">
{{PAYMENTS}}
    </div>
    <button type="button" id="add-payment">Add payment</button>
    <button type="button" id="save">Save configuration</button>
    <p id="status"></p>
  </main>
  <template id="payment-row">{{EMPTY_ROW}}</template>
  <script>
    const payments = document.getElementById('payments');
    const statusLine = document.getElementById('status');

    const bindRemove = (row) => {
      row.querySelector('.remove').addEventListener('click', () => {
        if (payments.children.length > 1) {
          row.remove();
        }
      });
    };

    Array.from(payments.children).forEach(bindRemove);

    document.getElementById('add-payment').addEventListener('click', () => {
      const row = document.getElementById('payment-row').content.firstElementChild.cloneNode(true);
      payments.appendChild(row);
      bindRemove(row);
    });

    document.getElementById('save').addEventListener('click', async () => {
      const selectedDays = {};
      document.querySelectorAll('input[name="day"]').forEach((input) => {
        selectedDays[input.value] = input.checked;
      });
      const possiblePayments = Array.from(payments.children).map((row) => ({
        paymentName: row.querySelector('.payment-name').value,
        paymentCost: row.querySelector('.payment-cost').value
      }));
      const totalPrice = document.getElementById('total-price').value;

      const res = await fetch('/api/configuration', {
        method: 'PUT',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ selectedDays, possiblePayments, totalPrice })
      });
      if (!res.ok) {
        statusLine.textContent = await res.text();
        return;
      }
      window.location.href = '/';
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule_day(payment: Option<Payment>) -> ScheduleDay {
        ScheduleDay {
            day: "02.03".to_string(),
            date: "2026-03-02".to_string(),
            weekday: "Mon".to_string(),
            is_paid: payment.is_some(),
            is_moved: matches!(payment, Some(Payment::Moved { .. })),
            message: payment.as_ref().map(Payment::message),
            moved_to_weekday: match &payment {
                Some(Payment::Moved { .. }) => Some("Wed".to_string()),
                _ => None,
            },
            payment,
        }
    }

    #[test]
    fn tracker_page_shows_balance_and_forms() {
        let schedule = ScheduleResponse {
            day_of_last_payment: Some("2026-03-02".to_string()),
            money_left: "160".to_string(),
            days: vec![schedule_day(None)],
        };
        let page = render_tracker(&Configuration::default(), &schedule);

        assert!(page.contains("Money left: 160"));
        assert!(page.contains(r#"name="day" value="02.03""#));
        assert!(page.contains(r#"<option value="140">Double: 140</option>"#));
        assert!(page.contains(r#"value="2026-03-02""#));
    }

    #[test]
    fn moved_day_strikes_original_date() {
        let schedule = ScheduleResponse {
            day_of_last_payment: None,
            money_left: "250".to_string(),
            days: vec![schedule_day(Some(Payment::Moved {
                value: "50".to_string(),
                moved_to: "04.03".to_string(),
            }))],
        };
        let page = render_tracker(&Configuration::default(), &schedule);

        assert!(page.contains(r#"<span class="struck">02.03</span><span>04.03</span>"#));
        assert!(page.contains(r#"<span class="struck">Mon</span><span>Wed</span>"#));
        assert!(page.contains("Payed: 50"));
    }

    #[test]
    fn setup_page_escapes_user_text() {
        let mut configuration = Configuration::default();
        configuration.possible_payments[0].name = "<b>Single</b>".to_string();
        let page = render_setup(&configuration);

        assert!(page.contains("&lt;b&gt;Single&lt;/b&gt;"));
        assert!(!page.contains("<b>Single</b>"));
        assert_eq!(page.matches(r#"type="checkbox""#).count(), 7);
    }
}
