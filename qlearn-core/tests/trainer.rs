use anyhow::Result;
use qlearn_core::{
    dummy::{DummyAgent, DummyEnv, DummyEnvConfig},
    error::QlearnError,
    record::{BufferedRecorder, ConsoleRecorder, NullRecorder},
    replay_buffer::{SimpleReplayBuffer, SimpleReplayBufferConfig},
    EpsilonGreedy, Env, ExperienceBufferBase, Phase, ReplayBufferBase, Trainer, TrainerConfig, TrainerState,
};
use tempdir::TempDir;

type Buffer = SimpleReplayBuffer<qlearn_core::dummy::DummyObs, qlearn_core::dummy::DummyAct>;

fn env(episode_len: usize, reward: f32) -> Result<DummyEnv> {
    let config = DummyEnvConfig {
        episode_len,
        reward,
    };
    DummyEnv::build(&config, 0)
}

fn buffer() -> Result<Buffer> {
    Buffer::build(&SimpleReplayBufferConfig::default().capacity(1000))
}

#[test]
fn test_one_episode_enters_reward_history() -> Result<()> {
    let config = TrainerConfig::default().min_replay_size(5).max_steps(10);
    let mut trainer = Trainer::build(config)?;
    let mut agent = DummyAgent::new(32);
    let mut buffer = buffer()?;

    let (state, _) = trainer.train(env(10, 1.0)?, &mut agent, &mut buffer, &mut NullRecorder::new())?;

    assert_eq!(state.phase, Phase::Terminated);
    assert_eq!(state.step, 10);
    assert_eq!(state.reward_history.iter().copied().collect::<Vec<_>>(), vec![10.0]);
    assert_eq!(buffer.len(), 15);
    Ok(())
}

#[test]
fn test_reward_history_holds_clipped_returns() -> Result<()> {
    let config = TrainerConfig::default()
        .min_replay_size(0)
        .max_steps(10)
        .clip_reward(1.0);
    let mut trainer = Trainer::build(config)?;
    let mut agent = DummyAgent::new(32);
    let mut buffer = buffer()?;

    let (state, _) = trainer.train(env(10, 5.0)?, &mut agent, &mut buffer, &mut NullRecorder::new())?;

    assert_eq!(state.reward_history.iter().copied().collect::<Vec<_>>(), vec![10.0]);
    assert!(buffer.iter().all(|tr| tr.reward == 1.0));
    Ok(())
}

#[test]
fn test_terminal_flag_only_on_last_transition() -> Result<()> {
    let config = TrainerConfig::default().min_replay_size(0).max_steps(10);
    let mut trainer = Trainer::build(config)?;
    let mut agent = DummyAgent::new(32);
    let mut buffer = buffer()?;

    trainer.train(env(10, 1.0)?, &mut agent, &mut buffer, &mut NullRecorder::new())?;

    let dones = buffer.iter().map(|tr| tr.done).collect::<Vec<_>>();
    assert_eq!(dones.iter().filter(|&&d| d).count(), 1);
    assert!(dones[9]);
    Ok(())
}

#[test]
fn test_target_sync_and_log_intervals() -> Result<()> {
    let config = TrainerConfig::default()
        .min_replay_size(0)
        .max_steps(10)
        .target_update_interval(3)
        .log_interval(4);
    let mut trainer = Trainer::build(config)?;
    let mut agent = DummyAgent::new(32);
    let mut buffer = buffer()?;
    let mut recorder = BufferedRecorder::new();

    trainer.train(env(100, 1.0)?, &mut agent, &mut buffer, &mut recorder)?;

    // Steps 0, 3, 6 and 9
    assert_eq!(agent.n_syncs, 4);

    // Steps 0, 4 and 8
    let steps = recorder
        .iter()
        .map(|r| r.get_integer("step"))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(steps, vec![0, 4, 8]);
    for record in recorder.iter() {
        assert_eq!(record.get_scalar("avg_reward")?, 0.0);
        assert!(record.get_scalar("epsilon")? <= 1.0);
    }
    Ok(())
}

#[test]
fn test_optimization_waits_for_batch() -> Result<()> {
    let config = TrainerConfig::default().min_replay_size(0).max_steps(40);
    let mut trainer = Trainer::build(config)?;
    let mut agent = DummyAgent::new(32);
    let mut buffer = buffer()?;

    let (state, _) = trainer.train(env(100, 1.0)?, &mut agent, &mut buffer, &mut NullRecorder::new())?;

    // The buffer reaches 32 transitions at step 31
    assert_eq!(agent.n_opts, 9);
    assert_eq!(state.last_loss, Some(0.5));
    Ok(())
}

#[test]
fn test_stops_at_target_reward() -> Result<()> {
    let config = TrainerConfig::default()
        .min_replay_size(0)
        .log_interval(10)
        .target_reward(10.0);
    let mut trainer = Trainer::build(config)?;
    let mut agent = DummyAgent::new(32);
    let mut buffer = buffer()?;
    let mut recorder = BufferedRecorder::new();

    let (state, _) = trainer.train(env(10, 1.0)?, &mut agent, &mut buffer, &mut recorder)?;

    assert_eq!(state.solved, Some((10, 10.0)));
    assert_eq!(state.step, 11);
    assert_eq!(state.phase, Phase::Terminated);
    assert_eq!(recorder.len(), 2);
    Ok(())
}

#[test]
fn test_exploration_rate_selects_policy() -> Result<()> {
    let greedy = EpsilonGreedy::with_final_step(1).eps_start(0.0).eps_final(0.0);
    let config = TrainerConfig::default()
        .min_replay_size(0)
        .max_steps(20)
        .explorer(greedy);
    let mut agent = DummyAgent::new(32);
    Trainer::build(config)?.train(env(10, 1.0)?, &mut agent, &mut buffer()?, &mut NullRecorder::new())?;
    assert_eq!(agent.n_samples, 20);

    let random = EpsilonGreedy::with_final_step(1).eps_start(1.0).eps_final(1.0);
    let config = TrainerConfig::default()
        .min_replay_size(0)
        .max_steps(20)
        .explorer(random);
    let mut agent = DummyAgent::new(32);
    Trainer::build(config)?.train(env(10, 1.0)?, &mut agent, &mut buffer()?, &mut NullRecorder::new())?;
    assert_eq!(agent.n_samples, 0);
    Ok(())
}

#[test]
fn test_terminated_state_takes_no_step() -> Result<()> {
    let config = TrainerConfig::default().min_replay_size(0).max_steps(3);
    let mut trainer = Trainer::build(config)?;
    let mut agent = DummyAgent::new(32);
    let mut buffer = buffer()?;
    let mut recorder = NullRecorder::new();

    let (mut state, env) = trainer.train(env(10, 1.0)?, &mut agent, &mut buffer, &mut recorder)?;
    let mut sampler = trainer.sampler(env);
    trainer.train_step(&mut agent, &mut buffer, &mut sampler, &mut state, &mut recorder)?;

    assert_eq!(state.step, 3);
    assert_eq!(buffer.len(), 3);
    Ok(())
}

#[test]
fn test_save_agent_in_model_dir() -> Result<()> {
    let dir = TempDir::new("trainer")?;
    let model_dir = dir.path().join("model");
    let config = TrainerConfig::default()
        .min_replay_size(0)
        .max_steps(40)
        .model_dir(model_dir.to_string_lossy());
    let mut agent = DummyAgent::new(8);
    Trainer::build(config)?.train(env(10, 1.0)?, &mut agent, &mut buffer()?, &mut NullRecorder::new())?;

    let mut loaded = DummyAgent::new(8);
    <DummyAgent as qlearn_core::Agent<DummyEnv, Buffer>>::load_params(&mut loaded, &model_dir)?;
    assert_eq!(loaded.n_opts, agent.n_opts);
    Ok(())
}

#[test]
fn test_zero_interval_is_rejected() {
    assert!(Trainer::build(TrainerConfig::default().log_interval(0)).is_err());
}

#[test]
fn test_invalid_reward_clip_is_rejected() -> Result<()> {
    for bound in [-1.0, f32::NAN, f32::INFINITY] {
        let err = match Trainer::build(TrainerConfig::default().clip_reward(bound)) {
            Ok(_) => panic!("clip_reward {} was accepted", bound),
            Err(err) => err,
        };
        assert!(matches!(
            err.downcast_ref::<QlearnError>(),
            Some(QlearnError::InvalidConfig(_))
        ));
    }

    // A zero bound is valid and zeroes every reward
    let config = TrainerConfig::default()
        .min_replay_size(0)
        .max_steps(10)
        .clip_reward(0.0);
    let mut buffer = buffer()?;
    Trainer::build(config)?.train(env(10, 1.0)?, &mut DummyAgent::new(32), &mut buffer, &mut NullRecorder::new())?;
    assert!(buffer.iter().all(|tr| tr.reward == 0.0));
    Ok(())
}

#[test]
fn test_progress_keeps_large_steps_exact() -> Result<()> {
    let config = TrainerConfig::default().min_replay_size(0).log_interval(1);
    let mut trainer = Trainer::build(config)?;
    let mut agent = DummyAgent::new(32);
    let mut buffer = buffer()?;
    let mut sampler = trainer.sampler(env(10, 1.0)?);
    let mut state = TrainerState::new(100);
    state.phase = Phase::Training;
    state.step = 16_777_217;
    let mut recorder = BufferedRecorder::new();

    trainer.train_step(&mut agent, &mut buffer, &mut sampler, &mut state, &mut recorder)?;

    let record = recorder.iter().next().expect("no progress record");
    assert_eq!(record.get_integer("step")?, 16_777_217);
    assert_eq!(
        ConsoleRecorder::format(record),
        Some("Step: 16777217, Avg Reward: 0.0".to_string())
    );
    Ok(())
}
