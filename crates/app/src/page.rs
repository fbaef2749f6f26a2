//! The single HTML page served at `/`.

use crate::simple_md::{escape_html, render_markdown};

pub const DEFAULT_TOPIC: &str = "artificial intelligence";
pub const PLACEHOLDER_OUTPUT: &str = "Enter a topic and click 'Process News' to get started!";

pub const EXAMPLE_TOPICS: [&str; 6] = [
    "artificial intelligence",
    "climate change",
    "cryptocurrency",
    "space exploration",
    "renewable energy",
    "healthcare technology",
];

const STYLE: &str = r#"
body { font-family: system-ui, -apple-system, "Segoe UI", sans-serif; background: #f5f7fb; margin: 0; }
.container { max-width: 800px; margin: auto; padding: 1.5em; }
.news-title { font-size: 2em; font-weight: bold; text-align: center; margin-bottom: 0.3em; color: #2c3e50; }
.subtitle { text-align: center; color: #7f8c8d; margin-bottom: 2em; }
label { display: block; font-weight: 600; margin-bottom: 0.4em; color: #2c3e50; }
input[type=text] { width: 100%; box-sizing: border-box; padding: 0.7em; font-size: 1em; border: 1px solid #d0d7e2; border-radius: 8px; }
button.primary { width: 100%; margin-top: 0.8em; padding: 0.8em; font-size: 1.1em; color: #fff; background: #5a67d8; border: none; border-radius: 8px; cursor: pointer; }
button.primary:disabled { background: #a3aae8; cursor: progress; }
.progress { display: none; margin-top: 1em; }
.progress .bar { height: 8px; background: #e2e8f0; border-radius: 4px; overflow: hidden; }
.progress .fill { height: 100%; width: 0; background: #5a67d8; transition: width 0.3s; }
.progress .message { color: #4a5568; margin-top: 0.4em; font-size: 0.9em; }
.output { margin-top: 1.5em; padding: 1em 1.2em; background: #fff; border-radius: 10px; border: 1px solid #e2e8f0; line-height: 1.5; }
.examples { margin-top: 1.5em; }
.examples button { margin: 0.2em; padding: 0.4em 0.8em; border: 1px solid #d0d7e2; border-radius: 6px; background: #fff; cursor: pointer; }
.footer { text-align: center; margin-top: 2em; padding: 1em; background-color: #f8f9fa; border-radius: 10px; }
.footer p { color: #6c757d; margin: 0; }
"#;

const SCRIPT: &str = r#"
(function () {
  var form = document.getElementById('news-form');
  var input = document.getElementById('topic');
  var button = document.getElementById('process');
  var output = document.getElementById('output');
  var progress = document.getElementById('progress');
  var fill = progress.querySelector('.fill');
  var message = progress.querySelector('.message');

  function showProgress(percent, text) {
    progress.style.display = 'block';
    fill.style.width = (percent || 0) + '%';
    message.textContent = text || '';
  }

  function finish(job) {
    output.innerHTML = job.output_html;
    progress.style.display = 'none';
    button.disabled = false;
  }

  function poll(id) {
    fetch('/api/jobs/' + id)
      .then(function (r) { return r.json(); })
      .then(function (job) {
        showProgress(job.percent, job.message);
        if (job.status === 'running') {
          setTimeout(function () { poll(id); }, 500);
        } else {
          finish(job);
        }
      })
      .catch(function () { setTimeout(function () { poll(id); }, 1000); });
  }

  form.addEventListener('submit', function (event) {
    event.preventDefault();
    button.disabled = true;
    showProgress(0, 'Starting...');
    fetch('/api/jobs', {
      method: 'POST',
      headers: { 'Content-Type': 'application/x-www-form-urlencoded' },
      body: new URLSearchParams({ topic: input.value })
    })
      .then(function (r) { return r.json(); })
      .then(function (body) { poll(body.job_id); })
      .catch(function () { form.submit(); });
  });

  document.querySelectorAll('.examples button').forEach(function (b) {
    b.addEventListener('click', function () { input.value = b.dataset.topic; input.focus(); });
  });
})();
"#;

/// Full page with `topic` in the input box and `output` (markdown) rendered below.
pub fn render_page(topic: &str, output: &str) -> String {
    let examples = EXAMPLE_TOPICS
        .iter()
        .map(|t| {
            let t = escape_html(t);
            format!(r#"<button type="button" data-topic="{0}">{0}</button>"#, t)
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>AI News Processor</title>
  <style>{style}</style>
</head>
<body>
  <div class="container">
    <div class="news-title">📰 News Inshorts Agent</div>
    <p class="subtitle">Get comprehensive news summaries powered by AI agents</p>

    <form id="news-form" method="post" action="/process">
      <label for="topic">News Topic</label>
      <input type="text" id="topic" name="topic" value="{topic}"
             placeholder="Enter a news topic (e.g., artificial intelligence, climate change, technology)">
      <button type="submit" id="process" class="primary">🔍 Process News</button>
    </form>

    <div id="progress" class="progress">
      <div class="bar"><div class="fill"></div></div>
      <div class="message"></div>
    </div>

    <div id="output" class="output">{output}</div>

    <div class="examples">
      <label>Example Topics</label>
      {examples}
    </div>

    <div class="footer">
      <p>Powered by OpenAI GPT-4o-mini • Real-time Google news search • Professional AI summaries</p>
    </div>
  </div>
  <script>{script}</script>
</body>
</html>
"#,
        style = STYLE,
        topic = escape_html(topic),
        output = render_markdown(output),
        examples = examples,
        script = SCRIPT,
    )
}
