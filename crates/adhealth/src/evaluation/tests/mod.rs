mod classifier;
mod common;
mod evaluator;
