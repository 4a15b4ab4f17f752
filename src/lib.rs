//! Japanese prose linting language server.
//!
//! Analyzes Japanese text in plain documents and in comment/prose regions
//! of source files, publishing part-of-speech tokens, style diagnostics and
//! editor decorations over a persistent document session.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService};

pub mod analysis;
pub mod document;
pub mod encoding;
pub mod lsp;
pub mod mask;
pub mod reference;
pub mod settings;

pub use analysis::{NullTokenizer, Token, Tokenizer};
pub use document::{apply_content_changes, changed_lines, DocumentState, DocumentStore, LineIndex};
pub use mask::{mask_document, MaskOutcome};
pub use reference::{ReferenceCache, ReferenceService};
pub use settings::Settings;

use lsp::{
    CommentHighlights, ContentHighlights, DiagnosticCache, HighlightRangesParams,
    SemanticHighlights, SemanticHighlightsParams,
};

pub struct Backend {
    client: Client,
    documents: DocumentStore,
    diagnostics: DiagnosticCache,
    tokenizer: Arc<dyn Tokenizer>,
    references: ReferenceService,
    workspace_root: OnceLock<PathBuf>,
    settings: OnceLock<Arc<Settings>>,
}

impl Backend {
    pub(crate) fn new(
        client: Client,
        tokenizer: Arc<dyn Tokenizer>,
        references: ReferenceService,
    ) -> Self {
        Self {
            client,
            documents: DocumentStore::new(),
            diagnostics: DiagnosticCache::new(),
            tokenizer,
            references,
            workspace_root: OnceLock::new(),
            settings: OnceLock::new(),
        }
    }

    fn settings(&self) -> Arc<Settings> {
        self.settings.get().cloned().unwrap_or_default()
    }

    /// Re-analyze a document and push diagnostics plus decoration channels.
    async fn analyze_and_publish(
        &self,
        uri: Url,
        text: String,
        language_id: String,
        version: i32,
    ) {
        let settings = self.settings();
        let state = self.documents.open(
            uri.clone(),
            text,
            language_id,
            version,
            self.tokenizer.as_ref(),
            &settings,
        );

        self.diagnostics.rebuild(&uri, &state.diagnostics);
        self.client
            .publish_diagnostics(uri.clone(), state.diagnostics.clone(), Some(state.version))
            .await;

        self.send_decorations(&uri, &state).await;
    }

    /// Push the three custom decoration notifications for a document.
    async fn send_decorations(&self, uri: &Url, state: &DocumentState) {
        let comment_ranges = state
            .mask
            .comments
            .iter()
            .map(|s| state.line_index.span_to_range(&(s.start..s.end)))
            .collect();
        self.client
            .send_notification::<CommentHighlights>(HighlightRangesParams {
                uri: uri.clone(),
                ranges: comment_ranges,
            })
            .await;

        let content_ranges = state
            .mask
            .content_highlight_ranges()
            .iter()
            .map(|r| state.line_index.span_to_range(r))
            .collect();
        self.client
            .send_notification::<ContentHighlights>(HighlightRangesParams {
                uri: uri.clone(),
                ranges: content_ranges,
            })
            .await;

        // Japanese documents use protocol semantic tokens; the simplified
        // channel stays empty for them and carries tokens for masked ones.
        let tokens = if state.is_japanese() {
            Vec::new()
        } else {
            lsp::highlight_tokens(&state.tokens)
        };
        self.client
            .send_notification::<SemanticHighlights>(SemanticHighlightsParams {
                uri: uri.clone(),
                tokens,
            })
            .await;
    }

    /// Protocol semantic tokens are answered only for Japanese documents.
    fn semantic_tokens_for(&self, uri: &Url) -> Option<Vec<SemanticToken>> {
        let state = self.documents.get(uri)?;
        lsp::tokens_for_document(&state)
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let workspace_root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|f| f.uri.to_file_path().ok())
            .or_else(|| {
                #[allow(deprecated)]
                params.root_uri.as_ref()?.to_file_path().ok()
            });

        if let Some(root) = &workspace_root {
            let _ = self.workspace_root.set(root.clone());
        }

        let settings = settings::resolve_settings(
            workspace_root.as_deref(),
            params.initialization_options,
        );
        let _ = self.settings.set(Arc::new(settings));

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(false),
                        })),
                        ..Default::default()
                    },
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(
                        SemanticTokensOptions {
                            legend: lsp::legend(),
                            full: Some(SemanticTokensFullOptions::Bool(true)),
                            range: Some(true),
                            work_done_progress_options: WorkDoneProgressOptions::default(),
                        },
                    ),
                ),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "kousei language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.analyze_and_publish(doc.uri, doc.text, doc.language_id, doc.version)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(state) = self.documents.get(&uri) else {
            return;
        };

        let old_text = state.source().to_string();
        let new_text = apply_content_changes(&old_text, &params.content_changes);

        // Changed lines drive cache invalidation only; the re-analysis that
        // follows is always whole-document.
        let changed = changed_lines(&old_text, &new_text);
        self.diagnostics.invalidate_lines(&uri, &changed);

        self.analyze_and_publish(
            uri,
            new_text,
            state.language_id.clone(),
            params.text_document.version,
        )
        .await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(state) = self.documents.get(&uri) else {
            return;
        };
        self.analyze_and_publish(
            uri,
            state.source().to_string(),
            state.language_id.clone(),
            state.version,
        )
        .await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.close(&uri);
        self.diagnostics.remove(&uri);
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let tokens = self.semantic_tokens_for(&params.text_document.uri);
        Ok(tokens.map(|data| {
            SemanticTokensResult::Tokens(SemanticTokens {
                result_id: None,
                data,
            })
        }))
    }

    async fn semantic_tokens_range(
        &self,
        params: SemanticTokensRangeParams,
    ) -> Result<Option<SemanticTokensRangeResult>> {
        let tokens = self.semantic_tokens_for(&params.text_document.uri);
        Ok(tokens.map(|data| {
            SemanticTokensRangeResult::Tokens(SemanticTokens {
                result_id: None,
                data,
            })
        }))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some(state) = self.documents.get(uri) else {
            return Ok(None);
        };

        let offset = state.line_index.offset_at(position);
        if !lsp::hover_allowed(&state, offset) {
            return Ok(None);
        }

        let Some(token) = lsp::token_at(&state.tokens, position) else {
            return Ok(None);
        };

        let mut reference = None;
        if token.feature.is_noun() {
            let query = lsp::reference_query(token);
            match self.references.cached(&query) {
                Some(entry) => reference = Some(entry),
                None => self.references.spawn_fetch(query),
            }
        }

        Ok(Some(lsp::hover_for_token(token, reference.as_ref())))
    }
}

/// Build the LSP service with an injected tokenizer backend.
pub fn create_service(
    tokenizer: Arc<dyn Tokenizer>,
) -> (LspService<Backend>, tower_lsp::ClientSocket) {
    let references = ReferenceService::new(Arc::new(ReferenceCache::new()));
    LspService::new(move |client| {
        Backend::new(client, Arc::clone(&tokenizer), references.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_can_be_created() {
        let (_service, _socket) = create_service(Arc::new(NullTokenizer));
    }
}
