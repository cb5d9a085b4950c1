mod pipeline;
mod reorder;
