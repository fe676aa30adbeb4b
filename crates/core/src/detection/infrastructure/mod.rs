pub mod replay_engine;
