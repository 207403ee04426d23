use crate::models::{Activity, ProgramDayView, StreakResult, UserProfile};
use chrono::NaiveDate;

pub struct UserPage<'a> {
    pub profile: &'a UserProfile,
    pub today: NaiveDate,
    pub elapsed_days: u32,
    pub program_day: ProgramDayView,
    pub stats: StreakResult,
    pub breathwork: Option<&'a Activity>,
    pub show_skip_prompt: bool,
    /// Set when the page was rendered for a `?today=` date; the prompt's
    /// forms carry it along.
    pub today_override: Option<NaiveDate>,
}

pub fn render_index() -> String {
    page_shell(INDEX_BODY)
}

pub fn render_user_page(page: &UserPage<'_>) -> String {
    let user_id = escape_html(&page.profile.user_id);
    let query = page
        .today_override
        .map(|today| format!("?today={today}"))
        .unwrap_or_default();
    let prompt = if page.show_skip_prompt {
        SKIP_PROMPT
            .replace("{{QUERY}}", &query)
            .replace("{{USER_ID}}", &user_id)
    } else {
        String::new()
    };
    let activity = page
        .breathwork
        .map(|activity| escape_html(&activity.name))
        .unwrap_or_else(|| "No breathwork activity set up yet".to_string());

    // User text goes in last so nothing it contains is read as a placeholder.
    let body = USER_BODY
        .replace("{{DATE}}", &page.today.to_string())
        .replace("{{DAY}}", &page.program_day.day_index.to_string())
        .replace("{{ELAPSED}}", &page.elapsed_days.to_string())
        .replace("{{EMBED_URL}}", &page.program_day.embed_url)
        .replace("{{STREAK}}", &page.stats.current_streak.to_string())
        .replace("{{TOTAL}}", &page.stats.total_completions.to_string())
        .replace("{{ACTIVE_DAYS}}", &page.stats.unique_active_days.to_string())
        .replace("{{PROMPT}}", &prompt)
        .replace("{{ACTIVITY}}", &activity)
        .replace("{{NAME}}", &escape_html(&page.profile.name));
    page_shell(&body)
}

fn page_shell(body: &str) -> String {
    SHELL.replace("{{BODY}}", body)
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

const SHELL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Breathwork Tracker</title>
  <style>
    :root {
      --bg: #eef4f1;
      --ink: #1f2d2a;
      --accent: #2f8f7a;
      --muted: #6b7c77;
      --card: rgba(255, 255, 255, 0.9);
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(160deg, var(--bg), #d9ebe4);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 24px;
    }

    .app {
      width: min(820px, 100%);
      background: var(--card);
      border-radius: 24px;
      padding: 32px;
      display: grid;
      gap: 24px;
      box-shadow: 0 20px 50px rgba(31, 45, 42, 0.15);
    }

    .stats {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 12px;
    }

    .stat {
      background: white;
      border-radius: 16px;
      padding: 16px;
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      color: var(--muted);
    }

    .stat .value {
      font-size: 1.6rem;
      font-weight: 600;
    }

    iframe {
      width: 100%;
      aspect-ratio: 16 / 9;
      border: 0;
      border-radius: 16px;
    }

    .overlay {
      position: fixed;
      inset: 0;
      background: rgba(31, 45, 42, 0.55);
      display: flex;
      align-items: center;
      justify-content: center;
    }

    .prompt {
      background: white;
      border-radius: 20px;
      padding: 28px;
      max-width: 480px;
      display: grid;
      gap: 12px;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 14px 18px;
      font-size: 1rem;
      cursor: pointer;
      width: 100%;
    }

    .primary {
      background: var(--accent);
      color: white;
    }
  </style>
</head>
<body>
  <main class="app">
{{BODY}}
  </main>
</body>
</html>
"#;

const INDEX_BODY: &str = r#"    <h1>Breathwork Tracker</h1>
    <p>Open <code>/users/&lt;user id&gt;</code> to see today's video and your streak.</p>
"#;

const USER_BODY: &str = r#"    <header>
      <h1>Hi {{NAME}}</h1>
      <p>{{DATE}} &middot; {{ACTIVITY}}</p>
    </header>
    <section class="stats">
      <div class="stat"><span class="label">Program day</span><span class="value">{{DAY}} / 30</span></div>
      <div class="stat"><span class="label">Days since start</span><span class="value">{{ELAPSED}}</span></div>
      <div class="stat"><span class="label">Current streak</span><span class="value">{{STREAK}}</span></div>
      <div class="stat"><span class="label">Completions</span><span class="value">{{TOTAL}}</span></div>
      <div class="stat"><span class="label">Active days</span><span class="value">{{ACTIVE_DAYS}}</span></div>
    </section>
    <iframe src="{{EMBED_URL}}" title="Day {{DAY}} breathwork" allowfullscreen></iframe>
{{PROMPT}}"#;

const SKIP_PROMPT: &str = r#"    <div class="overlay">
      <div class="prompt">
        <h2>Missed yesterday's breathwork</h2>
        <p>You didn't complete yesterday's breathwork video. Would you like to:</p>
        <form method="post" action="/users/{{USER_ID}}/reset{{QUERY}}"><button class="primary">Start over from day 1</button></form>
        <form method="post" action="/users/{{USER_ID}}/continue{{QUERY}}"><button>Continue to the next day</button></form>
        <p>Starting over keeps the program's progression intact.</p>
      </div>
    </div>
"#;
