//! Request orchestration: fan-out, routing, selection and formatting

pub mod fanout;
pub mod formatter;
pub mod pipeline;
pub mod router;
pub mod selector;

pub use fanout::{FanOutCoordinator, FanOutRequest, Invocation};
pub use pipeline::{Deployment, Outcome, Reply};
pub use router::{KeywordRouter, Route};
pub use selector::{
    build_synthesis_prompt, select_first_success, synthesize, Selection, SelectionPolicy,
    SynthesisStep, FALLBACK_MESSAGE,
};
