//! UI Routes - HTML pages for the feedback service
//!
//! Vanilla HTML/CSS/JS (ES6+, no frameworks). The form page posts to the
//! feedback API; the dashboard polls the summary endpoints and follows
//! live pipeline events over SSE.

use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::AppState;

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(feedback_page))
        .route("/dashboard", get(dashboard_page))
}

/// Root page - customer feedback form
async fn feedback_page() -> impl IntoResponse {
    Html(
        r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Pulse - Share Your Feedback</title>
    <style>
        body {
            font-family: system-ui, -apple-system, sans-serif;
            max-width: 700px;
            margin: 40px auto;
            padding: 20px;
            line-height: 1.6;
        }
        h1 {
            color: #333;
            border-bottom: 2px solid #0066cc;
            padding-bottom: 10px;
        }
        label {
            display: block;
            font-weight: 600;
            margin-top: 16px;
        }
        select, textarea, input {
            width: 100%;
            padding: 8px;
            margin-top: 4px;
            border: 1px solid #ccc;
            border-radius: 4px;
            font-family: inherit;
            font-size: 14px;
            box-sizing: border-box;
        }
        textarea {
            min-height: 120px;
            resize: vertical;
        }
        .button {
            display: inline-block;
            padding: 10px 20px;
            background: #0066cc;
            color: white;
            border: none;
            border-radius: 4px;
            margin-top: 20px;
            font-size: 15px;
            cursor: pointer;
        }
        .button:hover {
            background: #0052a3;
        }
        .button:disabled {
            background: #999;
            cursor: wait;
        }
        #result {
            margin-top: 24px;
            padding: 16px;
            border-radius: 4px;
            display: none;
        }
        #result.ok {
            background: #eef7ee;
            border: 1px solid #008800;
        }
        #result.error {
            background: #fbeeee;
            border: 1px solid #cc0000;
        }
        .optional-note {
            color: #666;
            font-weight: 400;
            font-size: 13px;
        }
    </style>
</head>
<body>
    <h1>Share Your Feedback</h1>
    <p>Tell us how we did. Every submission gets a personal response.</p>

    <form id="feedback-form">
        <label for="rating">Rating</label>
        <select id="rating" required>
            <option value="5">5 - Excellent</option>
            <option value="4">4 - Good</option>
            <option value="3" selected>3 - Okay</option>
            <option value="2">2 - Poor</option>
            <option value="1">1 - Terrible</option>
        </select>

        <label for="review">Your review</label>
        <textarea id="review" required placeholder="What went well? What could we improve?"></textarea>

        <label for="name">Name <span class="optional-note">(optional)</span></label>
        <input id="name" type="text">

        <label for="email">Email <span class="optional-note">(optional)</span></label>
        <input id="email" type="email">

        <label for="category">Category <span class="optional-note">(optional)</span></label>
        <input id="category" type="text" placeholder="e.g. shipping, support, product">

        <button type="submit" class="button" id="submit-btn">Submit Feedback</button>
    </form>

    <div id="result"></div>

    <p><small><a href="/dashboard">Team dashboard</a></small></p>

    <script>
        const form = document.getElementById('feedback-form');
        const result = document.getElementById('result');
        const submitBtn = document.getElementById('submit-btn');

        const optional = (id) => {
            const value = document.getElementById(id).value.trim();
            return value.length > 0 ? value : null;
        };

        form.addEventListener('submit', async (e) => {
            e.preventDefault();
            submitBtn.disabled = true;
            result.style.display = 'none';

            const body = {
                rating: parseInt(document.getElementById('rating').value, 10),
                review: document.getElementById('review').value,
                name: optional('name'),
                email: optional('email'),
                category: optional('category'),
            };

            try {
                const resp = await fetch('/api/feedback', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(body),
                });
                const data = await resp.json();

                if (resp.ok) {
                    result.className = 'ok';
                    result.innerHTML = '<strong>Thank you!</strong><p>' +
                        escapeHtml(data.record.ai_response) + '</p>';
                    form.reset();
                } else {
                    result.className = 'error';
                    result.innerHTML = '<strong>Submission failed:</strong> ' +
                        escapeHtml(data.error.message);
                }
            } catch (err) {
                result.className = 'error';
                result.innerHTML = '<strong>Network error:</strong> ' + escapeHtml(err.message);
            }

            result.style.display = 'block';
            submitBtn.disabled = false;
        });

        function escapeHtml(text) {
            const div = document.createElement('div');
            div.textContent = text;
            return div.innerHTML;
        }
    </script>
</body>
</html>
        "#,
    )
}

/// Dashboard page - aggregate stats, recent feedback, live events
async fn dashboard_page() -> impl IntoResponse {
    Html(
        r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Pulse - Feedback Dashboard</title>
    <style>
        body {
            font-family: system-ui, -apple-system, sans-serif;
            max-width: 1000px;
            margin: 40px auto;
            padding: 20px;
            line-height: 1.5;
        }
        h1 {
            color: #333;
            border-bottom: 2px solid #0066cc;
            padding-bottom: 10px;
        }
        .tiles {
            display: grid;
            grid-template-columns: repeat(5, 1fr);
            gap: 12px;
            margin: 20px 0;
        }
        .tile {
            background: #f5f5f5;
            border-radius: 4px;
            padding: 16px;
            text-align: center;
        }
        .tile .value {
            font-size: 28px;
            font-weight: 700;
            color: #0066cc;
        }
        .tile .label {
            font-size: 13px;
            color: #666;
        }
        .histogram-row {
            display: flex;
            align-items: center;
            gap: 8px;
            margin: 4px 0;
        }
        .histogram-bar {
            height: 18px;
            background: #0066cc;
            border-radius: 2px;
            min-width: 2px;
            transition: width 0.3s ease;
        }
        .feedback-item {
            border: 1px solid #e0e0e0;
            border-radius: 4px;
            padding: 12px;
            margin: 10px 0;
        }
        .feedback-item .meta {
            font-size: 13px;
            color: #666;
        }
        .button {
            display: inline-block;
            padding: 10px 20px;
            background: #0066cc;
            color: white;
            border: none;
            border-radius: 4px;
            text-decoration: none;
            margin: 10px 5px 10px 0;
            font-size: 14px;
            cursor: pointer;
        }
        .button:hover {
            background: #0052a3;
        }
        #insights {
            background: #f5f5f5;
            padding: 16px;
            border-radius: 4px;
            white-space: pre-wrap;
            display: none;
        }
        #live-status {
            font-size: 13px;
            color: #008800;
        }
    </style>
</head>
<body>
    <h1>Feedback Dashboard</h1>
    <p id="live-status">Connecting to live events...</p>

    <div class="tiles">
        <div class="tile"><div class="value" id="stat-count">-</div><div class="label">Total</div></div>
        <div class="tile"><div class="value" id="stat-mean">-</div><div class="label">Mean Rating</div></div>
        <div class="tile"><div class="value" id="stat-positive">-</div><div class="label">Positive Rate</div></div>
        <div class="tile"><div class="value" id="stat-negative">-</div><div class="label">Negative Count</div></div>
        <div class="tile"><div class="value" id="stat-users">-</div><div class="label">Unique Users</div></div>
    </div>

    <h2>Rating Distribution</h2>
    <div id="histogram"></div>

    <h2>Insights</h2>
    <button class="button" id="insights-btn">Analyze All Feedback</button>
    <a class="button" href="/api/export/csv">Download CSV</a>
    <div id="insights"></div>

    <h2>Recent Feedback</h2>
    <div id="feedback-list"></div>

    <p><small><a href="/">← Back to the feedback form</a></small></p>

    <script>
        async function refresh() {
            const summary = await (await fetch('/api/dashboard/summary')).json();
            document.getElementById('stat-count').textContent = summary.count;
            document.getElementById('stat-mean').textContent = summary.mean_rating.toFixed(2);
            document.getElementById('stat-positive').textContent =
                (summary.positive_rate * 100).toFixed(0) + '%';
            document.getElementById('stat-negative').textContent = summary.negative_count;
            document.getElementById('stat-users').textContent = summary.unique_users;

            const maxCount = Math.max(1, ...Object.values(summary.rating_histogram));
            const histogram = document.getElementById('histogram');
            histogram.innerHTML = '';
            for (let rating = 5; rating >= 1; rating--) {
                const count = summary.rating_histogram[rating] || 0;
                const row = document.createElement('div');
                row.className = 'histogram-row';
                row.innerHTML = '<span style="width: 20px">' + rating + '</span>' +
                    '<div class="histogram-bar" style="width: ' +
                    (count / maxCount * 500) + 'px"></div><span>' + count + '</span>';
                histogram.appendChild(row);
            }

            const listing = await (await fetch('/api/feedback?sort=newest')).json();
            const list = document.getElementById('feedback-list');
            list.innerHTML = '';
            for (const record of listing.records.slice(0, 20)) {
                const item = document.createElement('div');
                item.className = 'feedback-item';
                const who = record.name ? escapeHtml(record.name) : 'Anonymous';
                item.innerHTML =
                    '<div class="meta">' + record.rating + '/5 · ' + who + ' · ' +
                    new Date(record.created_at).toLocaleString() + '</div>' +
                    '<div>' + escapeHtml(record.review) + '</div>' +
                    '<div class="meta"><em>' + escapeHtml(record.ai_summary) + '</em></div>';
                list.appendChild(item);
            }
        }

        document.getElementById('insights-btn').addEventListener('click', async () => {
            const panel = document.getElementById('insights');
            panel.style.display = 'block';
            panel.textContent = 'Analyzing...';
            const resp = await fetch('/api/dashboard/insights', { method: 'POST' });
            const data = await resp.json();
            panel.textContent = resp.ok
                ? data.insights
                : 'Analysis failed: ' + data.error.message;
        });

        function escapeHtml(text) {
            const div = document.createElement('div');
            div.textContent = text;
            return div.innerHTML;
        }

        const events = new EventSource('/api/events');
        events.addEventListener('Connected', () => {
            document.getElementById('live-status').textContent = 'Live';
        });
        events.addEventListener('SubmissionPersisted', refresh);
        events.addEventListener('SubmissionRejected', refresh);
        events.onerror = () => {
            document.getElementById('live-status').textContent = 'Live events disconnected';
        };

        refresh();
    </script>
</body>
</html>
        "#,
    )
}
