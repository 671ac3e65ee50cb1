use axum::response::{Html, IntoResponse};

/// 首页处理器
pub async fn index_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Skin Condition Classifier</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            color: #333;
        }
        .container {
            background: white;
            border-radius: 20px;
            padding: 40px;
            box-shadow: 0 20px 60px rgba(0, 0, 0, 0.1);
            max-width: 640px;
            width: 90%;
            text-align: center;
        }
        h1 { color: #5a67d8; margin-bottom: 10px; }
        .subtitle { color: #666; margin-bottom: 30px; }
        .upload-area {
            border: 2px dashed #cbd5e0;
            border-radius: 12px;
            padding: 40px 20px;
            cursor: pointer;
            transition: all 0.2s;
        }
        .upload-area.dragover { border-color: #5a67d8; background: #f0f4ff; }
        #imagePreview, #results, #loading { display: none; margin-top: 24px; }
        #previewImg { max-width: 100%; max-height: 300px; border-radius: 12px; }
        .buttons { margin-top: 16px; }
        button {
            border: none;
            border-radius: 8px;
            padding: 10px 24px;
            margin: 0 6px;
            font-size: 1em;
            cursor: pointer;
            color: white;
            background: #5a67d8;
        }
        button.secondary { background: #a0aec0; }
        .confidence-bar { background: #edf2f7; border-radius: 8px; height: 12px; margin: 12px 0 20px; }
        .confidence-fill { background: #5a67d8; border-radius: 8px; height: 100%; width: 0; }
        .probability-item {
            display: flex;
            justify-content: space-between;
            padding: 10px 14px;
            margin: 6px 0;
            border-left: 4px solid transparent;
            border-radius: 6px;
            background: #f7fafc;
        }
        .error { color: #e53e3e; margin-top: 16px; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Skin Condition Classifier</h1>
        <p class="subtitle">Acne · Eczema · Tinea · Warts</p>

        <div class="upload-area" id="uploadArea">
            <p>Drop an image here or click to choose a file</p>
            <input type="file" id="imageInput" accept="image/*" hidden>
        </div>

        <div id="imagePreview">
            <img id="previewImg" alt="preview">
            <div class="buttons">
                <button id="classifyBtn">Classify</button>
                <button id="clearBtn" class="secondary">Clear</button>
            </div>
        </div>

        <div id="loading">Analyzing image...</div>
        <div id="error" class="error"></div>

        <div id="results">
            <h2 id="predictedClass"></h2>
            <p id="confidence"></p>
            <div class="confidence-bar"><div class="confidence-fill" id="confidenceFill"></div></div>
            <div id="probabilityList"></div>
        </div>
    </div>

    <script>
        let selectedFile = null;
        const $ = (id) => document.getElementById(id);

        $('uploadArea').addEventListener('click', () => $('imageInput').click());
        $('imageInput').addEventListener('change', (e) => {
            if (e.target.files[0]) selectImage(e.target.files[0]);
        });
        $('uploadArea').addEventListener('dragover', (e) => {
            e.preventDefault();
            e.currentTarget.classList.add('dragover');
        });
        $('uploadArea').addEventListener('dragleave', (e) => {
            e.currentTarget.classList.remove('dragover');
        });
        $('uploadArea').addEventListener('drop', (e) => {
            e.preventDefault();
            e.currentTarget.classList.remove('dragover');
            if (e.dataTransfer.files.length > 0) selectImage(e.dataTransfer.files[0]);
        });
        $('classifyBtn').addEventListener('click', classifyImage);
        $('clearBtn').addEventListener('click', clearImage);

        function selectImage(file) {
            selectedFile = file;
            const reader = new FileReader();
            reader.onload = (e) => {
                $('previewImg').src = e.target.result;
                $('imagePreview').style.display = 'block';
                $('results').style.display = 'none';
                $('error').textContent = '';
            };
            reader.readAsDataURL(file);
        }

        function clearImage() {
            selectedFile = null;
            $('imagePreview').style.display = 'none';
            $('results').style.display = 'none';
            $('loading').style.display = 'none';
            $('imageInput').value = '';
            fetch('/image', { method: 'DELETE' });
        }

        async function classifyImage() {
            if (!selectedFile) return;
            $('loading').style.display = 'block';
            $('results').style.display = 'none';
            $('error').textContent = '';

            try {
                const form = new FormData();
                form.append('file', selectedFile);
                const response = await fetch('/classify/upload', { method: 'POST', body: form });
                const body = await response.json();
                if (!response.ok) throw new Error(body.error ? body.error.message : response.statusText);
                displayResults(body.data);
            } catch (err) {
                $('error').textContent = err.message;
            } finally {
                $('loading').style.display = 'none';
            }
        }

        function displayResults(outcome) {
            $('results').style.display = 'block';
            $('predictedClass').textContent = outcome.predicted_class;
            $('confidence').textContent = outcome.confidence_percentage + '%';
            $('confidenceFill').style.width = outcome.confidence_percentage + '%';

            const list = $('probabilityList');
            list.innerHTML = '';
            outcome.all_results.forEach((result) => {
                const item = document.createElement('div');
                item.className = 'probability-item';
                if (result.class_name === outcome.predicted_class) {
                    item.style.borderLeftColor = result.color;
                    item.style.backgroundColor = result.color + '15';
                }
                const name = document.createElement('span');
                name.textContent = result.class_name;
                const value = document.createElement('span');
                value.textContent = result.percentage + '%';
                item.append(name, value);
                list.appendChild(item);
            });
        }
    </script>
</body>
</html>
"#;
