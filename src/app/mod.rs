// Application layer: pipeline implementations wiring core + adapters.

pub mod pipelines;
