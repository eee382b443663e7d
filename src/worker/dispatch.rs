//! Dispatcher: one request in, exactly one response out.
//!
//! Each request variant is routed to the primary provider first. Whether the
//! fallback provider is consulted afterwards is decided by a fixed policy
//! per variant (see [`FallbackPolicy::for_kind`]), not by what the primary
//! happened to return for some other variant.
//!
//! Both providers write into the *same* response:
//! - boolean outcomes: the last provider called wins outright
//! - metadata reads: the fallback merges into what the primary already
//!   resolved (its fields win on overlap, untouched ones survive)

use std::path::Path;

use crate::core::provider::TagProvider;

use super::protocol::{Request, RequestKind, Response};

/// When to call the fallback provider after the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Only when the primary reported `false`.
    OnFailure,
    /// Always, as a complementary source.
    Always,
    /// Never; the primary's answer is final.
    Never,
}

impl FallbackPolicy {
    pub fn for_kind(kind: RequestKind) -> Self {
        match kind {
            RequestKind::ProbeFile
            | RequestKind::WriteMetadata
            | RequestKind::WriteEmbeddedArt
            | RequestKind::WritePlaycount
            | RequestKind::WriteRating => FallbackPolicy::OnFailure,
            // No provider can say "I resolved everything" for a read, so the
            // specialized reader always gets a go at filling the gaps.
            RequestKind::ReadMetadata => FallbackPolicy::Always,
            // Empty art is a valid answer.
            RequestKind::ReadEmbeddedArt => FallbackPolicy::Never,
        }
    }

    fn should_consult(self, primary_succeeded: bool) -> bool {
        match self {
            FallbackPolicy::OnFailure => !primary_succeeded,
            FallbackPolicy::Always => true,
            FallbackPolicy::Never => false,
        }
    }
}

/// Produce the response for `request`.
///
/// `None` (empty request) and [`Request::Unknown`] yield [`Response::Empty`]
/// without calling either provider.
pub fn dispatch(
    request: Option<&Request>,
    primary: &dyn TagProvider,
    fallback: &dyn TagProvider,
) -> Response {
    let Some((request, kind)) = request.and_then(|r| r.kind().map(|k| (r, k))) else {
        return Response::default();
    };

    let mut response = Response::empty_for(kind);

    let succeeded = handle(request, &mut response, primary);
    if FallbackPolicy::for_kind(kind).should_consult(succeeded) {
        tracing::debug!(%kind, primary = primary.name(), fallback = fallback.name(), "consulting fallback provider");
        handle(request, &mut response, fallback);
    }

    response
}

/// Run one provider against the request, writing into `response`.
/// Returns the provider's boolean outcome (reads report a fixed value).
fn handle(request: &Request, response: &mut Response, provider: &dyn TagProvider) -> bool {
    match (request, response) {
        (Request::ProbeFile { path }, Response::ProbeFile { success }) => {
            *success = provider.probe_is_media_file(path);
            *success
        }
        (Request::ReadMetadata { path }, Response::ReadMetadata { metadata }) => {
            provider.read_metadata(path, metadata);
            false
        }
        (Request::WriteMetadata { path, metadata }, Response::WriteMetadata { success }) => {
            *success = provider.write_metadata(path, metadata);
            *success
        }
        (Request::ReadEmbeddedArt { path }, Response::ReadEmbeddedArt { data }) => {
            *data = provider.read_embedded_art(path);
            true
        }
        (Request::WriteEmbeddedArt { path, data }, Response::WriteEmbeddedArt { success }) => {
            *success = provider.write_embedded_art(path, data);
            *success
        }
        (Request::WritePlaycount { path, metadata }, Response::WritePlaycount { success }) => {
            *success = provider.write_playcount(path, metadata);
            *success
        }
        (Request::WriteRating { path, metadata }, Response::WriteRating { success }) => {
            *success = provider.write_rating(path, metadata);
            *success
        }
        // `response` is always shaped from `request`; nothing else reaches here.
        (request, _) => {
            tracing::debug!(?request, "request/response shape mismatch");
            false
        }
    }
}

/// Path a request targets, for log fields.
pub fn request_path(request: &Request) -> Option<&Path> {
    match request {
        Request::ProbeFile { path }
        | Request::ReadMetadata { path }
        | Request::WriteMetadata { path, .. }
        | Request::ReadEmbeddedArt { path }
        | Request::WriteEmbeddedArt { path, .. }
        | Request::WritePlaycount { path, .. }
        | Request::WriteRating { path, .. } => Some(path),
        Request::Unknown => None,
    }
}
