use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Veritas | GraphRAG Agent</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 0 auto; max-width: 960px; padding: 2rem; color: #1d1d1f; }
    h1 { margin-bottom: 0.25rem; }
    .caption { color: #666; margin-top: 0; }
    .card { border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; }
    #history { min-height: 240px; }
    .msg { padding: 0.6rem 0.8rem; border-radius: 8px; margin: 0.5rem 0; white-space: pre-wrap; }
    .user { background: #eef4ff; }
    .assistant { background: #f6f8fa; }
    .error { background: #fdecec; color: #a40000; }
    form { display: flex; gap: 0.5rem; }
    input[type=text] { flex: 1; padding: 0.6rem; }
    button { padding: 0.6rem 1rem; }
    pre { background: #fff; padding: 0.5rem; overflow: auto; }
  </style>
</head>
<body>
  <h1>Veritas: GraphRAG Agent</h1>
  <p class="caption">Hybrid retrieval: vector similarity + keyword graph lookup</p>

  <div class="card">
    <strong>Ingest a document</strong>
    <form id="uploadForm">
      <input id="fileInput" type="file" accept="application/pdf,.pdf" />
      <button type="submit">Ingest PDF</button>
    </form>
    <div id="uploadStatus"></div>
  </div>

  <div class="card" id="history"></div>

  <form id="askForm">
    <input id="question" type="text" placeholder="Ask about your document..." autocomplete="off" />
    <button type="submit">Ask</button>
  </form>

  <script>
    const history = document.getElementById('history');
    const askForm = document.getElementById('askForm');
    const question = document.getElementById('question');
    const uploadForm = document.getElementById('uploadForm');
    const uploadStatus = document.getElementById('uploadStatus');
    const messages = [];

    function render() {
      history.innerHTML = '';
      for (const m of messages) {
        const div = document.createElement('div');
        div.className = 'msg ' + m.role;
        div.textContent = m.content;
        if (m.sources) {
          const details = document.createElement('details');
          const summary = document.createElement('summary');
          summary.textContent = 'System internals';
          const pre = document.createElement('pre');
          pre.textContent = JSON.stringify(m.sources, null, 2) + '\nBackend status: ' + m.status;
          details.appendChild(summary);
          details.appendChild(pre);
          div.appendChild(details);
        }
        history.appendChild(div);
      }
      history.scrollTop = history.scrollHeight;
    }

    askForm.addEventListener('submit', async (event) => {
      event.preventDefault();
      const query = question.value.trim();
      if (!query) return;
      question.value = '';
      messages.push({ role: 'user', content: query });
      messages.push({ role: 'assistant', content: 'Thinking (querying graph + vector store)...' });
      render();
      try {
        const res = await fetch('/ask', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ query })
        });
        const json = await res.json();
        messages.pop();
        if (res.ok) {
          messages.push({ role: 'assistant', content: json.answer, sources: json.sources, status: res.status });
        } else {
          messages.push({ role: 'error', content: 'API error: ' + (json.error || res.statusText) });
        }
      } catch (err) {
        messages.pop();
        messages.push({ role: 'error', content: 'Connection failed: ' + err });
      }
      render();
    });

    uploadForm.addEventListener('submit', async (event) => {
      event.preventDefault();
      const fileInput = document.getElementById('fileInput');
      if (!fileInput.files.length) {
        uploadStatus.textContent = 'Select a PDF first.';
        return;
      }
      const formData = new FormData();
      formData.append('file', fileInput.files[0]);
      uploadStatus.textContent = 'Ingesting...';
      const res = await fetch('/ingest', { method: 'POST', body: formData });
      const json = await res.json();
      uploadStatus.textContent = res.ok
        ? `Indexed ${json.chunks} chunks from ${json.pages} pages of ${json.document}`
        : 'Ingestion failed: ' + json.error;
    });
  </script>
</body>
</html>"#)
}
