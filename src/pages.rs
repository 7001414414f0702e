//! Embedded web UI
//!
//! The dashboard and login pages ship inside the binary, same as the static
//! assets they reference. All rendering happens in the browser against the
//! JSON API.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};

/// Serve the main dashboard HTML
pub fn serve_index() -> Response<Full<Bytes>> {
    html_response(INDEX_HTML)
}

/// Serve the login page HTML
pub fn serve_login() -> Response<Full<Bytes>> {
    html_response(LOGIN_HTML)
}

/// Serve the shared stylesheet
pub fn serve_css() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/css")
        .body(Full::new(Bytes::from(STYLE_CSS)))
        .unwrap()
}

/// Serve the dashboard JavaScript
pub fn serve_js() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/javascript")
        .body(Full::new(Bytes::from(APP_JS)))
        .unwrap()
}

/// Serve the login page JavaScript
pub fn serve_login_js() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/javascript")
        .body(Full::new(Bytes::from(LOGIN_JS)))
        .unwrap()
}

/// Redirect anonymous page requests to the login page
pub fn redirect_to_login() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header("Location", "/login.html")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn html_response(body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>homelinks</title>
    <link rel="stylesheet" href="/assets/style.css">
</head>
<body>
    <nav class="navbar">
        <div class="nav-brand"><h1>homelinks</h1></div>
        <div class="nav-actions">
            <input type="search" id="search" placeholder="Search apps...">
            <select id="category-filter"><option value="">All categories</option></select>
            <button class="btn" id="view-toggle" title="Toggle grid/list">&#9638;</button>
            <button class="btn" id="theme-toggle" title="Toggle theme">&#9728;</button>
            <button class="btn btn-primary" onclick="showAppForm()">Add App</button>
            <button class="btn" onclick="logout()">Logout</button>
        </div>
    </nav>

    <main class="container">
        <div id="apps" class="apps-grid"></div>
        <div id="pagination" class="pagination"></div>
    </main>

    <!-- Add/Edit modal -->
    <div id="modal" class="modal hidden">
        <div class="modal-content">
            <h2 id="modal-title">Add App</h2>
            <form id="app-form">
                <input type="hidden" id="app-id">
                <label>Name<input type="text" id="app-name" required maxlength="200"></label>
                <label>URL<input type="text" id="app-url" required placeholder="example.com"></label>
                <label>Category<input type="text" id="app-category" maxlength="50"></label>
                <label>Description<textarea id="app-description" maxlength="500"></textarea></label>
                <label>Image<input type="file" id="app-image" accept="image/png,image/jpeg,image/webp"></label>
                <div class="modal-actions">
                    <button type="button" class="btn" onclick="hideAppForm()">Cancel</button>
                    <button type="submit" class="btn btn-primary">Save</button>
                </div>
                <p id="form-error" class="error hidden"></p>
            </form>
        </div>
    </div>

    <script src="/assets/app.js"></script>
</body>
</html>
"##;

const LOGIN_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>homelinks - Login</title>
    <link rel="stylesheet" href="/assets/style.css">
</head>
<body>
    <main class="login-container">
        <form id="login-form" class="login-card">
            <h1>homelinks</h1>
            <label>Email<input type="email" id="email" required autocomplete="username"></label>
            <label>Password<input type="password" id="password" required autocomplete="current-password"></label>
            <button type="submit" class="btn btn-primary">Sign in</button>
            <p id="login-error" class="error hidden"></p>
        </form>
    </main>
    <script src="/assets/login.js"></script>
</body>
</html>
"##;

const STYLE_CSS: &str = r##":root {
    --bg: #f5f6f8;
    --card: #ffffff;
    --text: #1d2330;
    --muted: #6b7280;
    --accent: #3b82f6;
    --border: #e2e5ea;
}
body.dark {
    --bg: #14171d;
    --card: #1e232c;
    --text: #e7eaf0;
    --muted: #9aa3b2;
    --border: #2b313c;
}
* { box-sizing: border-box; }
body { margin: 0; font-family: system-ui, sans-serif; background: var(--bg); color: var(--text); }
.navbar { display: flex; align-items: center; justify-content: space-between; gap: 1rem;
    padding: 0.6rem 1.2rem; background: var(--card); border-bottom: 1px solid var(--border); }
.navbar h1 { font-size: 1.1rem; margin: 0; }
.nav-actions { display: flex; gap: 0.5rem; align-items: center; flex-wrap: wrap; }
.nav-actions input[type="search"], .nav-actions select {
    padding: 0.4rem 0.6rem; border: 1px solid var(--border); border-radius: 6px;
    background: var(--bg); color: var(--text); }
.btn { padding: 0.4rem 0.8rem; border: 1px solid var(--border); border-radius: 6px;
    background: var(--card); color: var(--text); cursor: pointer; }
.btn-primary { background: var(--accent); border-color: var(--accent); color: #fff; }
.container { max-width: 1100px; margin: 1.5rem auto; padding: 0 1rem; }
.apps-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 1rem; }
.apps-grid.list-view { grid-template-columns: 1fr; }
.app-card { background: var(--card); border: 1px solid var(--border); border-radius: 10px;
    padding: 1rem; display: flex; flex-direction: column; gap: 0.4rem; }
.app-card .thumb { width: 48px; height: 48px; object-fit: cover; border-radius: 8px; }
.app-card .name { font-weight: 600; text-decoration: none; color: var(--text); }
.app-card .category { font-size: 0.75rem; color: var(--accent); }
.app-card .description { font-size: 0.85rem; color: var(--muted); }
.app-card .card-actions { display: flex; gap: 0.4rem; margin-top: auto; }
.favorite { color: #eab308; cursor: pointer; background: none; border: none; font-size: 1.1rem; }
.pagination { display: flex; gap: 0.4rem; justify-content: center; margin: 1.5rem 0; }
.pagination .btn.active { background: var(--accent); border-color: var(--accent); color: #fff; }
.modal { position: fixed; inset: 0; background: rgba(0,0,0,0.45); display: flex;
    align-items: center; justify-content: center; }
.modal.hidden, .hidden { display: none; }
.modal-content { background: var(--card); border-radius: 10px; padding: 1.5rem; width: min(420px, 90vw); }
.modal-content label { display: block; margin-bottom: 0.7rem; font-size: 0.85rem; }
.modal-content input, .modal-content textarea { width: 100%; margin-top: 0.2rem;
    padding: 0.45rem; border: 1px solid var(--border); border-radius: 6px;
    background: var(--bg); color: var(--text); }
.modal-actions { display: flex; justify-content: flex-end; gap: 0.5rem; margin-top: 1rem; }
.error { color: #dc2626; font-size: 0.85rem; }
.login-container { display: flex; align-items: center; justify-content: center; min-height: 100vh; }
.login-card { background: var(--card); border: 1px solid var(--border); border-radius: 10px;
    padding: 2rem; width: min(360px, 90vw); display: flex; flex-direction: column; gap: 0.8rem; }
.login-card h1 { margin: 0 0 0.5rem; font-size: 1.3rem; text-align: center; }
.login-card input { width: 100%; margin-top: 0.2rem; padding: 0.5rem;
    border: 1px solid var(--border); border-radius: 6px; background: var(--bg); color: var(--text); }
"##;

const APP_JS: &str = r##"const PAGE_SIZE = 24;
let allApps = [];
let page = 1;

const appsEl = document.getElementById('apps');
const searchEl = document.getElementById('search');
const categoryEl = document.getElementById('category-filter');

async function fetchJson(url, options) {
    const res = await fetch(url, options);
    if (res.status === 401) {
        window.location.href = '/login.html';
        throw new Error('unauthorized');
    }
    return res;
}

async function loadApps() {
    const res = await fetchJson('/api/apps');
    allApps = await res.json();
    render();
}

async function loadCategories() {
    const res = await fetchJson('/api/apps/categories');
    const categories = await res.json();
    categoryEl.innerHTML = '<option value="">All categories</option>' +
        categories.map((c) => `<option value="${escapeHtml(c)}">${escapeHtml(c)}</option>`).join('');
}

function visibleApps() {
    const q = searchEl.value.trim().toLowerCase();
    const cat = categoryEl.value.toLowerCase();
    return allApps.filter((app) => {
        if (cat && (app.category || '').toLowerCase() !== cat) return false;
        if (!q) return true;
        return app.name.toLowerCase().includes(q) ||
            (app.description || '').toLowerCase().includes(q);
    });
}

function render() {
    const apps = visibleApps();
    const pages = Math.max(1, Math.ceil(apps.length / PAGE_SIZE));
    if (page > pages) page = pages;
    const slice = apps.slice((page - 1) * PAGE_SIZE, page * PAGE_SIZE);

    appsEl.innerHTML = slice.map((app) => `
        <div class="app-card">
            ${app.image_url ? `<img class="thumb" src="${escapeHtml(app.image_url)}" alt="">` : ''}
            <a class="name" href="${escapeHtml(app.url)}" target="_blank" rel="noopener">${escapeHtml(app.name)}</a>
            ${app.category ? `<span class="category">${escapeHtml(app.category)}</span>` : ''}
            ${app.description ? `<span class="description">${escapeHtml(app.description)}</span>` : ''}
            <div class="card-actions">
                <button class="favorite" onclick="toggleFavorite(${app.id})">${app.favorite ? '★' : '☆'}</button>
                <button class="btn" onclick="editApp(${app.id})">Edit</button>
                <button class="btn" onclick="deleteApp(${app.id})">Delete</button>
            </div>
        </div>`).join('');

    const pagEl = document.getElementById('pagination');
    pagEl.innerHTML = pages <= 1 ? '' : Array.from({ length: pages }, (_, i) =>
        `<button class="btn ${i + 1 === page ? 'active' : ''}" onclick="goToPage(${i + 1})">${i + 1}</button>`).join('');
}

function goToPage(p) { page = p; render(); }

function escapeHtml(text) {
    const div = document.createElement('div');
    div.textContent = text;
    return div.innerHTML;
}

async function toggleFavorite(id) {
    await fetchJson(`/api/apps/${id}/favorite`, { method: 'PATCH' });
    await loadApps();
}

async function deleteApp(id) {
    if (!confirm('Delete this app?')) return;
    await fetchJson(`/api/apps/${id}`, { method: 'DELETE' });
    await Promise.all([loadApps(), loadCategories()]);
}

function showAppForm() {
    document.getElementById('modal-title').textContent = 'Add App';
    document.getElementById('app-form').reset();
    document.getElementById('app-id').value = '';
    document.getElementById('form-error').classList.add('hidden');
    document.getElementById('modal').classList.remove('hidden');
}

function editApp(id) {
    const app = allApps.find((a) => a.id === id);
    if (!app) return;
    showAppForm();
    document.getElementById('modal-title').textContent = 'Edit App';
    document.getElementById('app-id').value = app.id;
    document.getElementById('app-name').value = app.name;
    document.getElementById('app-url').value = app.url;
    document.getElementById('app-category').value = app.category || '';
    document.getElementById('app-description').value = app.description || '';
}

function hideAppForm() {
    document.getElementById('modal').classList.add('hidden');
}

document.getElementById('app-form').addEventListener('submit', async (e) => {
    e.preventDefault();
    const id = document.getElementById('app-id').value;
    const form = new FormData();
    form.append('name', document.getElementById('app-name').value);
    form.append('url', document.getElementById('app-url').value);
    form.append('category', document.getElementById('app-category').value);
    form.append('description', document.getElementById('app-description').value);
    const file = document.getElementById('app-image').files[0];
    if (file) form.append('image', file);

    const res = await fetchJson(id ? `/api/apps/${id}` : '/api/apps', {
        method: id ? 'PUT' : 'POST',
        body: form,
    });
    if (!res.ok) {
        const body = await res.json().catch(() => ({}));
        const errEl = document.getElementById('form-error');
        errEl.textContent = body.error || 'Request failed';
        errEl.classList.remove('hidden');
        return;
    }
    hideAppForm();
    await Promise.all([loadApps(), loadCategories()]);
});

async function logout() {
    await fetch('/api/logout', { method: 'POST' });
    window.location.href = '/login.html';
}

document.getElementById('view-toggle').addEventListener('click', () => {
    appsEl.classList.toggle('list-view');
    localStorage.setItem('view', appsEl.classList.contains('list-view') ? 'list' : 'grid');
});

document.getElementById('theme-toggle').addEventListener('click', () => {
    document.body.classList.toggle('dark');
    localStorage.setItem('theme', document.body.classList.contains('dark') ? 'dark' : 'light');
});

searchEl.addEventListener('input', () => { page = 1; render(); });
categoryEl.addEventListener('change', () => { page = 1; render(); });

if (localStorage.getItem('theme') === 'dark') document.body.classList.add('dark');
if (localStorage.getItem('view') === 'list') appsEl.classList.add('list-view');

loadApps();
loadCategories();
"##;

const LOGIN_JS: &str = r##"document.getElementById('login-form').addEventListener('submit', async (e) => {
    e.preventDefault();
    const res = await fetch('/api/login', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({
            email: document.getElementById('email').value,
            password: document.getElementById('password').value,
        }),
    });
    if (res.ok) {
        window.location.href = '/';
        return;
    }
    const body = await res.json().catch(() => ({}));
    const errEl = document.getElementById('login-error');
    errEl.textContent = body.error || 'Login failed';
    errEl.classList.remove('hidden');
});
"##;
