//! Server-rendered pages. Everything under `/app` sits behind the session
//! guard.

use std::sync::Arc;

use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login))
        .route("/app", get(dashboard))
        .route("/app/content", get(content))
        .route("/app/quiz", get(quiz))
        .route("/app/tutor", get(tutor))
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{title} · NEET Prep AI</title></head><body><main>{body}</main></body></html>"
    ))
}

async fn home() -> Html<String> {
    page(
        "Welcome",
        "<h1>NEET Prep AI</h1><p>Study smarter with an AI tutor and daily quizzes.</p>\
         <a href=\"/app\">Open the app</a>",
    )
}

async fn login() -> Html<String> {
    page(
        "Sign in",
        "<h1>Sign in</h1><p>Sign in with your account to continue.</p>",
    )
}

async fn dashboard() -> Html<String> {
    page(
        "Dashboard",
        "<h1>Dashboard</h1><nav><a href=\"/app/tutor\">AI Tutor</a> · \
         <a href=\"/app/quiz\">Quiz</a> · <a href=\"/app/content\">Content</a></nav>",
    )
}

async fn content() -> Html<String> {
    page("Content", "<h1>Content</h1><p>Study material by subject and topic.</p>")
}

const QUIZ_SCRIPT: &str = r#"<script>
async function post(body) {
  const res = await fetch('/api/quiz', {method: 'POST', headers: {'Content-Type': 'application/json'}, body: JSON.stringify(body)});
  return res.json();
}
let current = null;
async function start() {
  const {question} = await post({action: 'start'});
  current = question;
  const box = document.getElementById('quiz');
  if (!question) { box.textContent = 'No questions available.'; return; }
  box.innerHTML = '';
  const stem = document.createElement('p');
  stem.textContent = question.stem;
  box.appendChild(stem);
  (question.choices || []).forEach((choice, i) => {
    const btn = document.createElement('button');
    btn.textContent = choice;
    btn.onclick = async () => {
      const {result} = await post({action: 'submit', questionId: current.id, answer: i});
      document.getElementById('result').textContent = result;
    };
    box.appendChild(btn);
  });
}
</script>"#;

async fn quiz() -> Html<String> {
    page(
        "Quiz",
        &format!(
            "<h1>Quiz</h1><button onclick=\"start()\">Start</button>\
             <div id=\"quiz\"></div><p id=\"result\"></p>{QUIZ_SCRIPT}"
        ),
    )
}

// The answer arrives as raw text with no end marker; a body that stops
// early may be a truncated answer.
const TUTOR_SCRIPT: &str = r#"<script>
async function ask(event) {
  event.preventDefault();
  const out = document.getElementById('answer');
  out.textContent = '';
  const question = document.getElementById('question').value;
  const res = await fetch('/api/ai/tutor', {method: 'POST', headers: {'Content-Type': 'application/json'}, body: JSON.stringify({question})});
  if (!res.ok) { out.textContent = (await res.json()).error; return; }
  const reader = res.body.getReader();
  const decoder = new TextDecoder();
  for (;;) {
    const {done, value} = await reader.read();
    if (done) break;
    out.textContent += decoder.decode(value, {stream: true});
  }
}
</script>"#;

async fn tutor() -> Html<String> {
    page(
        "AI Tutor",
        &format!(
            "<h1>AI Tutor</h1><form onsubmit=\"ask(event)\">\
             <textarea id=\"question\" placeholder=\"Ask a NEET question\"></textarea>\
             <button type=\"submit\">Ask</button></form>\
             <pre id=\"answer\"></pre>{TUTOR_SCRIPT}"
        ),
    )
}
