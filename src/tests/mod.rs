pub(crate) mod helpers;
mod pipeline;
