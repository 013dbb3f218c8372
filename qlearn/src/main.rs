//! Train a DQN agent on CartPole, then watch it balance the pole.
mod config;
use anyhow::Result;
use clap::Parser;
use config::RunConfig;
use log::info;
use qlearn_candle_agent::{dqn::Dqn, mlp::Mlp};
use qlearn_cartpole_env::{CartPoleAct, CartPoleConfig, CartPoleEnv, CartPoleObs};
use qlearn_core::{
    record::ConsoleRecorder, replay_buffer::SimpleReplayBuffer, Agent, Configurable,
    DefaultEvaluator, Env as _, Evaluator as _, ReplayBufferBase, Trainer,
};
use std::path::Path;

type Env = CartPoleEnv;
type ReplayBuffer = SimpleReplayBuffer<CartPoleObs, CartPoleAct>;
type DqnAgent = Dqn<Env, Mlp, ReplayBuffer>;

/// Train/eval DQN agent in cartpole environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML file of the run configuration
    #[arg(short, long)]
    config: Option<String>,

    /// Train the agent, skip the episodes after training
    #[arg(long, default_value_t = false)]
    train_only: bool,

    /// Skip training and run episodes with the agent saved in the directory
    #[arg(short, long)]
    eval: Option<String>,

    /// Number of episodes run after training
    #[arg(long, default_value_t = 5)]
    episodes: usize,

    /// Do not draw the environment during the episodes
    #[arg(long, default_value_t = false)]
    no_render: bool,

    /// Random seed, overriding the one of the configuration
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop training after this number of steps
    #[arg(long)]
    max_steps: Option<usize>,

    /// Directory in which the trained agent is saved
    #[arg(long)]
    model_dir: Option<String>,

    /// Write the run configuration to the file and exit
    #[arg(long)]
    dump_config: Option<String>,
}

fn run_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }
    if let Some(max_steps) = args.max_steps {
        config.trainer_config = config.trainer_config.max_steps(max_steps);
    }
    if let Some(model_dir) = &args.model_dir {
        config.trainer_config = config.trainer_config.model_dir(model_dir);
    }
    Ok(config)
}

fn train(config: &RunConfig) -> Result<DqnAgent> {
    let mut trainer = Trainer::build(config.trainer_config.clone())?;
    let env = Env::build(&config.env_config, config.trainer_config.seed as i64)?;
    let mut agent = DqnAgent::build(config.agent_config.clone())?;
    let mut buffer = ReplayBuffer::build(&config.replay_buffer_config)?;
    let mut recorder = ConsoleRecorder::new();

    let (state, _) = trainer.train(env, &mut agent, &mut buffer, &mut recorder)?;
    if let Some((step, avg_reward)) = state.solved {
        println!("Solved at step {} with average reward {:?}!", step, avg_reward);
    }

    Ok(agent)
}

fn load(config: &RunConfig, model_dir: &str) -> Result<DqnAgent> {
    let mut agent = DqnAgent::build(config.agent_config.clone())?;
    agent.load_params(Path::new(model_dir))?;
    info!("Loaded the agent from {:?}", model_dir);
    Ok(agent)
}

fn episode_line(episode_reward: f32) -> String {
    format!("Episode Reward: {:?}", episode_reward)
}

fn run_episodes(
    agent: &mut DqnAgent,
    env_config: &CartPoleConfig,
    seed: u64,
    n_episodes: usize,
    render: bool,
) -> Result<Vec<f32>> {
    println!("Rendering the environment...");
    let mut evaluator = DefaultEvaluator::<Env>::new(env_config, seed as i64, 1)?.render(render);
    let mut episode_rewards = Vec::with_capacity(n_episodes);
    for _ in 0..n_episodes {
        let record = evaluator.evaluate(agent)?;
        let episode_reward = record.get_scalar("mean_episode_reward")?;
        println!("{}", episode_line(episode_reward));
        episode_rewards.push(episode_reward);
    }
    Ok(episode_rewards)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = run_config(&args)?;

    if let Some(path) = &args.dump_config {
        config.save(path)?;
        info!("Saved the run configuration in {:?}", path);
        return Ok(());
    }

    let mut agent = match &args.eval {
        Some(model_dir) => load(&config, model_dir)?,
        None => train(&config)?,
    };

    if !args.train_only {
        run_episodes(
            &mut agent,
            &config.env_config,
            config.trainer_config.seed,
            args.episodes,
            !args.no_render,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_dqn_cartpole() -> Result<()> {
        let tmp_dir = TempDir::new("dqn_cartpole")?;
        let model_dir = match tmp_dir.as_ref().to_str() {
            Some(s) => s.to_string(),
            None => panic!("Failed to get string of temporary directory"),
        };
        let args = Args::parse_from([
            "dqn_cartpole",
            "--max-steps",
            "300",
            "--model-dir",
            model_dir.as_str(),
            "--no-render",
        ]);
        let mut config = run_config(&args)?;
        config.trainer_config = config.trainer_config.min_replay_size(100);

        let mut trained = train(&config)?;
        let rewards_trained = run_episodes(&mut trained, &config.env_config, 0, 2, false)?;

        let mut loaded = load(&config, &model_dir)?;
        let rewards_loaded = run_episodes(&mut loaded, &config.env_config, 0, 2, false)?;

        assert_eq!(rewards_trained.len(), 2);
        assert_eq!(rewards_trained, rewards_loaded);
        assert!(rewards_trained.iter().all(|&r| (1.0..=500.0).contains(&r)));
        Ok(())
    }

    #[test]
    fn test_config_file_overrides_defaults() -> Result<()> {
        let tmp_dir = TempDir::new("dqn_cartpole_config")?;
        let path = tmp_dir.path().join("run.yaml");
        let mut config = RunConfig::default();
        config.agent_config = config.agent_config.batch_size(8);
        config.save(&path)?;

        let path = path.to_string_lossy().to_string();
        let args = Args::parse_from(["dqn_cartpole", "--config", path.as_str(), "--seed", "3"]);
        let loaded = run_config(&args)?;
        assert_eq!(loaded.agent_config.batch_size, 8);
        assert_eq!(loaded.trainer_config.seed, 3);
        Ok(())
    }

    #[test]
    fn test_config_file_seed_is_kept_without_flag() -> Result<()> {
        let tmp_dir = TempDir::new("dqn_cartpole_seed")?;
        let path = tmp_dir.path().join("run.yaml");
        RunConfig::default().seed(7).save(&path)?;

        let path = path.to_string_lossy().to_string();
        let args = Args::parse_from(["dqn_cartpole", "--config", path.as_str()]);
        let loaded = run_config(&args)?;
        assert_eq!(loaded.trainer_config.seed, 7);
        Ok(())
    }

    #[test]
    fn test_episode_line_prints_float() {
        assert_eq!(episode_line(500.0), "Episode Reward: 500.0");
        assert_eq!(episode_line(9.5), "Episode Reward: 9.5");
    }
}
