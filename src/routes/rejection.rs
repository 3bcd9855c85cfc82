use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        let error = if self.error.is_client_error() {
            format!("{}", self.error)
        } else {
            format!("{}: {}", self.context.failure(), self.error)
        };

        FlattenedRejection {
            success: false,
            context: self.context,
            error,
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    pub(crate) success: bool,
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) error: String,
}

/// What the request was trying to do when it failed.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Context {
    Create,
    List,
    Count,
    Locations,
    Overview,
    Heatmap,
    Daily,
}

impl Context {
    fn failure(self) -> &'static str {
        match self {
            Context::Create => "Failed to save mood entry",
            Context::Count => "Failed to count mood entries",
            _ => "Failed to fetch mood entries",
        }
    }
}
