//! Page controls wired to the paper service.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Element, Event, HtmlAnchorElement, HtmlElement, HtmlInputElement,
    HtmlTextAreaElement, Url,
};

use super::backdrop::Backdrop;
use super::{dom, http};
use crate::api::{
    self, AnalysisResult, AnalyzeForm, ChatRequest, ChatResponse, DownloadRequest, Endpoint,
    GenerateResponse,
};
use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};
use crate::pattern::Section;
use crate::session::{ChatOutcome, RequestKind, Session};

struct App {
    document: Document,
    config: AppConfig,
    session: RefCell<Session>,
    backdrop: Backdrop,
    loader: Element,
    loading_text: Element,
    results: Element,
    paper_output: Element,
    paper_content: Element,
    pattern_rows: Option<Element>,
    total_marks: Option<Element>,
    chat_log: Option<Element>,
}

pub fn bind(document: &Document, config: AppConfig, backdrop: Backdrop) -> Result<(), JsValue> {
    // Pages that only show the background have no form.
    if document.get_element_by_id("analyzeBtn").is_none() {
        log::debug!("no analyze form on this page");
        return Ok(());
    }

    let app = Rc::new(App {
        document: document.clone(),
        config,
        session: RefCell::new(Session::new()),
        backdrop,
        loader: dom::by_id(document, "loader")?,
        loading_text: dom::by_id(document, "loadingText")?,
        results: dom::by_id(document, "resultsSection")?,
        paper_output: dom::by_id(document, "paperOutput")?,
        paper_content: dom::by_id(document, "paperContent")?,
        pattern_rows: document.get_element_by_id("patternRows"),
        total_marks: document.get_element_by_id("totalMarks"),
        chat_log: document.get_element_by_id("chatLog"),
    });

    on_click(&app, "analyzeBtn", |app| spawn_local(app.analyze()))?;
    on_click(&app, "generateBtn", |app| spawn_local(app.generate()))?;
    on_click(&app, "downloadPdfBtn", |app| spawn_local(app.download()))?;
    if document.get_element_by_id("chatSendBtn").is_some() {
        on_click(&app, "chatSendBtn", |app| spawn_local(app.chat()))?;
    }
    if document.get_element_by_id("addSectionBtn").is_some() {
        on_click(&app, "addSectionBtn", |app| app.add_section())?;
    }
    if let Some(rows) = &app.pattern_rows {
        let editor = app.clone();
        dom::listen(rows, "change", move |e| editor.edit_row(&e))?;
        let editor = app.clone();
        dom::listen(rows, "click", move |e| editor.remove_row(&e))?;
    }
    Ok(())
}

fn on_click<F>(app: &Rc<App>, id: &str, handler: F) -> Result<(), JsValue>
where
    F: Fn(Rc<App>) + 'static,
{
    let button: HtmlElement = dom::by_id(&app.document, id)?;
    let app = app.clone();
    dom::listen(&button, "click", move |_| handler(app.clone()))
}

impl App {
    fn show_loader(&self, text: &str) {
        self.loading_text.set_text_content(Some(text));
        dom::set_hidden(&self.loader, false);
    }

    fn hide_loader(&self) {
        dom::set_hidden(&self.loader, true);
    }

    fn set_text(&self, id: &str, text: &str) {
        match self.document.get_element_by_id(id) {
            Some(el) => el.set_text_content(Some(text)),
            None => log::warn!("#{id} missing"),
        }
    }

    fn api_key(&self) -> String {
        dom::input_value(&self.document, "apiKey").unwrap_or_default()
    }

    fn begin(&self, kind: RequestKind) -> ClientResult<()> {
        self.session.borrow_mut().try_begin(kind)?;
        log::info!("{} started", kind);
        Ok(())
    }

    fn settle<T>(&self, kind: RequestKind, result: &ClientResult<T>) {
        self.session.borrow_mut().finish(kind);
        match result {
            Ok(_) => log::info!("{} finished", kind),
            Err(err) => log::warn!("{} failed: {}", kind, err),
        }
    }

    fn url(&self, endpoint: Endpoint) -> String {
        endpoint.url(&self.config.api_base)
    }

    // 1. Analyze

    async fn analyze(self: Rc<Self>) {
        let form = match self.analyze_form() {
            Ok(form) => form,
            Err(err) => return dom::alert(&err.to_string()),
        };
        if let Err(err) = form.validate() {
            return dom::alert(&err.to_string());
        }
        if let Err(err) = self.begin(RequestKind::Analyze) {
            return dom::alert(&err.to_string());
        }

        self.show_loader(form.loading_text());
        dom::set_hidden(&self.results, true);
        self.backdrop.engage_boost();

        let result = self.send_analyze(&form).await;
        self.settle(RequestKind::Analyze, &result);
        self.backdrop.release_boost();
        self.hide_loader();

        match result {
            Ok(analysis) => self.show_analysis(analysis),
            Err(err) => dom::alert(&format!("Analysis Failed: {err}")),
        }
    }

    fn analyze_form(&self) -> ClientResult<AnalyzeForm<web_sys::File>> {
        let files = |id: &str| -> Vec<web_sys::File> {
            dom::by_id::<HtmlInputElement>(&self.document, id)
                .ok()
                .and_then(|input| input.files())
                .map(|list| (0..list.length()).filter_map(|i| list.get(i)).collect())
                .unwrap_or_default()
        };
        let syllabus = dom::by_id::<HtmlTextAreaElement>(&self.document, "syllabusText")
            .map(|el| el.value())
            .map_err(|_| ClientError::MissingInput("Syllabus"))?;
        Ok(AnalyzeForm {
            api_key: self.api_key(),
            syllabus_text: syllabus,
            pyq_files: files("pyqFiles"),
            reference_file: files("referenceFile").into_iter().next(),
        })
    }

    async fn send_analyze(&self, form: &AnalyzeForm<web_sys::File>) -> ClientResult<AnalysisResult> {
        let data = web_sys::FormData::new().map_err(|e| ClientError::Transport(dom::describe(&e)))?;
        let append = |res: Result<(), JsValue>| res.map_err(|e| ClientError::Transport(dom::describe(&e)));
        append(data.append_with_str(api::FIELD_API_KEY, &form.api_key))?;
        append(data.append_with_str(api::FIELD_SYLLABUS_TEXT, &form.syllabus_text))?;
        for file in &form.pyq_files {
            append(data.append_with_blob_and_filename(api::FIELD_PYQ_FILES, file, &file.name()))?;
        }
        if let Some(file) = &form.reference_file {
            append(data.append_with_blob_and_filename(
                api::FIELD_REFERENCE_FILE,
                file,
                &file.name(),
            ))?;
        }
        http::post_form(&self.url(Endpoint::Analyze), &data).await
    }

    fn show_analysis(&self, analysis: AnalysisResult) {
        let summary = analysis.summary();
        self.set_text("topicCount", &summary.topic_count.to_string());
        self.set_text("priorityCount", &summary.priority_label);
        if let Some(el) = self.document.get_element_by_id("priorityCount") {
            let class = el.class_list();
            let res = if summary.pattern_detected {
                class.add_1("pattern-detected")
            } else {
                class.remove_1("pattern-detected")
            };
            res.ok();
        }
        self.session.borrow_mut().set_analysis(analysis);
        self.render_pattern();
        dom::set_hidden(&self.results, false);
    }

    // 2. Generate

    async fn generate(self: Rc<Self>) {
        let Some(request) = self.session.borrow().generate_request(&self.api_key()) else {
            return;
        };
        if let Err(err) = self.begin(RequestKind::Generate) {
            return dom::alert(&err.to_string());
        }
        self.show_loader("Generating Question Paper...");

        let result: ClientResult<GenerateResponse> =
            http::post_json(&self.url(Endpoint::Generate), &request).await;
        self.settle(RequestKind::Generate, &result);
        self.hide_loader();

        match result {
            Ok(reply) => {
                self.paper_content.set_text_content(Some(&reply.paper_text));
                self.session.borrow_mut().set_paper_text(reply.paper_text);
                dom::set_hidden(&self.paper_output, false);
            }
            Err(err) => dom::alert(&format!("Generation Failed: {err}")),
        }
    }

    // 3. Download

    async fn download(self: Rc<Self>) {
        let Some(text) = self.session.borrow().paper_text().map(str::to_owned) else {
            return;
        };
        if let Err(err) = self.begin(RequestKind::Download) {
            return dom::alert(&err.to_string());
        }

        let result = match self.download_request(text).await {
            Ok(request) => http::post_json_for_blob(&self.url(Endpoint::DownloadPdf), &request).await,
            Err(err) => Err(err),
        };
        self.settle(RequestKind::Download, &result);

        let saved = result.and_then(|blob| {
            self.save_blob(&blob)
                .map_err(|e| ClientError::Transport(dom::describe(&e)))
        });
        if let Err(err) = saved {
            dom::alert(&format!("Download Failed: {err}"));
        }
    }

    /// Paper text plus the optional header block: college name, logo, and
    /// free-form header lines.
    async fn download_request(&self, text: String) -> ClientResult<DownloadRequest> {
        let college = dom::input_value(&self.document, "collegeName").unwrap_or_default();
        let header_text = dom::by_id::<HtmlTextAreaElement>(&self.document, "headerText")
            .map(|el| el.value())
            .unwrap_or_default();
        let logo = dom::by_id::<HtmlInputElement>(&self.document, "headerImage")
            .ok()
            .and_then(|input| input.files())
            .and_then(|files| files.get(0));
        let header_image = match logo {
            Some(file) => Some(
                dom::read_data_url(&file)
                    .await
                    .map_err(|e| ClientError::Transport(dom::describe(&e)))?,
            ),
            None => None,
        };
        Ok(DownloadRequest::new(text, &college)
            .with_header_image(header_image)
            .with_header_text(&header_text))
    }

    fn save_blob(&self, blob: &web_sys::Blob) -> Result<(), JsValue> {
        let url = Url::create_object_url_with_blob(blob)?;
        let anchor: HtmlAnchorElement = self.document.create_element("a")?.dyn_into()?;
        anchor.set_href(&url);
        anchor.set_download(api::DOWNLOAD_FILE_NAME);
        let body = self.document.body().ok_or("no body")?;
        body.append_child(&anchor)?;
        anchor.click();
        body.remove_child(&anchor)?;
        Url::revoke_object_url(&url)
    }

    // 4. Chat

    async fn chat(self: Rc<Self>) {
        let Ok(input) = dom::by_id::<HtmlInputElement>(&self.document, "chatInput") else {
            return;
        };
        let message = input.value().trim().to_owned();
        let api_key = self.api_key();
        if message.is_empty() || api_key.is_empty() {
            return dom::alert(&ClientError::MissingInput("API Key, Message").to_string());
        }
        if let Err(err) = self.begin(RequestKind::Chat) {
            return dom::alert(&err.to_string());
        }
        input.set_value("");
        self.chat_line("user", &message);

        let request = ChatRequest {
            api_key,
            message,
            context: self.session.borrow().chat_context(),
        };
        let result: ClientResult<ChatResponse> =
            http::post_json(&self.url(Endpoint::Chat), &request).await;
        self.settle(RequestKind::Chat, &result);

        let outcome = result.map(|reply| {
            self.chat_line("assistant", &reply.reply);
            self.session.borrow_mut().apply_chat(&reply)
        });
        match outcome {
            Ok(ChatOutcome::PatternUpdated) => {
                self.render_pattern();
                self.chat_line("system", "Pattern updated.");
            }
            Ok(ChatOutcome::SuggestRegenerate) => {
                self.chat_line("system", "Press Generate to build a new paper.");
            }
            Ok(ChatOutcome::Reply) => {}
            Err(err) => dom::alert(&format!("Chat Failed: {err}")),
        }
    }

    fn chat_line(&self, role: &str, text: &str) {
        let Some(log_el) = &self.chat_log else {
            return;
        };
        let appended = self.document.create_element("div").and_then(|line| {
            line.set_class_name(&format!("chat-line chat-{role}"));
            line.set_text_content(Some(text));
            log_el.append_child(&line)
        });
        if let Err(err) = appended {
            log::warn!("chat log: {:?}", err);
        }
    }

    // Pattern rows

    fn render_pattern(&self) {
        let Some(rows) = &self.pattern_rows else {
            return;
        };
        rows.set_inner_html("");
        let session = self.session.borrow();
        let Some(pattern) = session.pattern() else {
            self.set_total(None);
            return;
        };
        for (index, section) in pattern.sections.iter().enumerate() {
            if let Err(err) = self.render_row(rows, index, section) {
                log::warn!("pattern row {index}: {:?}", err);
            }
        }
        self.set_total(Some(pattern.total_marks()));
    }

    fn render_row(&self, rows: &Element, index: usize, section: &Section) -> Result<(), JsValue> {
        let row = self.document.create_element("div")?;
        row.set_class_name("pattern-row");
        let fields = [
            ("name", "text", section.name.clone()),
            ("marks", "number", section.marks_per_question.to_string()),
            ("count", "number", section.question_count.to_string()),
        ];
        for (field, kind, value) in fields {
            let input: HtmlInputElement = self.document.create_element("input")?.dyn_into()?;
            input.set_type(kind);
            input.set_value(&value);
            input.set_attribute("data-index", &index.to_string())?;
            input.set_attribute("data-field", field)?;
            if kind == "number" {
                input.set_min("0");
            }
            row.append_child(&input)?;
        }
        let remove = self.document.create_element("button")?;
        remove.set_text_content(Some("Remove"));
        remove.set_attribute("data-index", &index.to_string())?;
        remove.set_attribute("data-action", "remove")?;
        row.append_child(&remove)?;
        rows.append_child(&row)?;
        Ok(())
    }

    fn set_total(&self, total: Option<u32>) {
        if let Some(el) = &self.total_marks {
            let text = total.map(|t| t.to_string()).unwrap_or_default();
            el.set_text_content(Some(&text));
        }
    }

    fn edit_row(&self, event: &Event) {
        let Some(input) = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        let Some(index) = row_index(&input) else {
            return;
        };
        let field = input.get_attribute("data-field").unwrap_or_default();
        let value = input.value();

        let edited = self.session.borrow_mut().edit_pattern(|pattern| {
            pattern.edit_row(index, &field, &value)?;
            Ok(pattern.total_marks())
        });
        match edited {
            Ok(total) => self.set_total(Some(total)),
            Err(err) => {
                log::warn!("pattern edit: {err}");
                // Put the stored values back into the row.
                self.render_pattern();
            }
        }
    }

    fn remove_row(&self, event: &Event) {
        let Some(button) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        if button.get_attribute("data-action").as_deref() != Some("remove") {
            return;
        }
        let Some(index) = row_index(&button) else {
            return;
        };
        let removed = self
            .session
            .borrow_mut()
            .edit_pattern(|pattern| pattern.remove_section(index));
        match removed {
            Ok(_) => self.render_pattern(),
            Err(err) => log::warn!("pattern edit: {err}"),
        }
    }

    fn add_section(&self) {
        let added = self.session.borrow_mut().edit_pattern(|pattern| {
            let n = pattern.sections.len() + 1;
            pattern.add_section(Section::new(format!("Section {n}"), 1, 1));
            Ok(())
        });
        match added {
            Ok(()) => self.render_pattern(),
            Err(_) => dom::alert("Analyze first to edit the paper pattern."),
        }
    }
}

fn row_index(el: &Element) -> Option<usize> {
    el.get_attribute("data-index")?.parse().ok()
}
