/*!
# Test Support

Test doubles shared by the workspace's unit and integration tests:

- [`ScriptedModel`]: a [`LanguageModel`] that records every prompt and answers
  from a script.
- [`write_text_pdf`]: writes a small real PDF with one line of text per page.
*/

use crate::types::{GenerateTextParams, LanguageModel};
use crate::{OrderScanError, Result};
use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

type Responder = Box<dyn Fn(&str) -> std::result::Result<String, String> + Send + Sync>;

enum Script {
    Queue(VecDeque<std::result::Result<String, String>>),
    Always(std::result::Result<String, String>),
    Responder(Responder),
}

/// Language model double that replays scripted answers
pub struct ScriptedModel {
    script: Mutex<Script>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    /// Empty queue; chain [`reply`](Self::reply) and [`fail`](Self::fail)
    pub fn new() -> Self {
        Self::with_script(Script::Queue(VecDeque::new()))
    }

    /// Answer every request with `text`
    pub fn always(text: impl Into<String>) -> Self {
        Self::with_script(Script::Always(Ok(text.into())))
    }

    /// Fail every request with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::with_script(Script::Always(Err(reason.into())))
    }

    /// Compute each answer from the prompt
    pub fn responding<F>(f: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, String> + Send + Sync + 'static,
    {
        Self::with_script(Script::Responder(Box::new(f)))
    }

    /// Queue a successful answer
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    /// Queue a failure
    pub fn fail(self, reason: impl Into<String>) -> Self {
        self.push(Err(reason.into()))
    }

    /// Prompts received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Number of requests received
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    fn with_script(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn push(self, answer: std::result::Result<String, String>) -> Self {
        if let Script::Queue(queue) = &mut *lock(&self.script) {
            queue.push_back(answer);
        }
        self
    }
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_text(&self, params: GenerateTextParams) -> Result<String> {
        lock(&self.prompts).push(params.prompt.clone());

        let answer = match &mut *lock(&self.script) {
            Script::Queue(queue) => queue
                .pop_front()
                .unwrap_or_else(|| Err("no scripted response left".to_string())),
            Script::Always(answer) => answer.clone(),
            Script::Responder(f) => f(&params.prompt),
        };
        answer.map_err(OrderScanError::model)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write a PDF with one page per entry of `pages`, each holding that line of
/// text in a standard Type1 font
pub fn write_text_pdf(path: impl AsRef<Path>, pages: &[&str]) -> Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| OrderScanError::pdf(format!("failed to encode page: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path.as_ref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_exhausted() {
        let model = ScriptedModel::new().reply("one").fail("boom");

        let first = model.generate_text(GenerateTextParams::prompt("a")).await;
        let second = model.generate_text(GenerateTextParams::prompt("b")).await;
        let third = model.generate_text(GenerateTextParams::prompt("c")).await;

        assert_eq!(first.unwrap(), "one");
        assert!(second.unwrap_err().to_string().contains("boom"));
        assert!(third.is_err());
        assert_eq!(model.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_failing_model() {
        let model = ScriptedModel::failing("quota exceeded");
        let err = model
            .generate_text(GenerateTextParams::prompt("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderScanError::Model(_)));
        assert_eq!(model.call_count(), 1);
    }

    #[test]
    fn test_write_text_pdf_loads() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sample.pdf");
        write_text_pdf(&path, &["alpha", "beta"]).unwrap();

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
