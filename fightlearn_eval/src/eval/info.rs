// info.rs

use std::time::Instant;

use fightlearn::reinforcement_learning::{EpisodeStats, FighterStep, HealthState, RoundResult};
use ratatui::{prelude::*, text::Span, widgets::*};

const REWARD_HISTORY: usize = 2000;

/// Dashboard state: the reward curve of the running episode, both health bars and the
/// session record.
#[derive(Clone, Debug)]
pub struct Info {
    policy: &'static str,
    episode: usize,
    total_steps: u64,
    episode_rewards: Vec<(f64, f64)>,
    health: HealthState,
    stats: EpisodeStats,
    session_wins: u32,
    session_losses: u32,
    last_action: String,
    last_round: Option<RoundResult>,
    paused: bool,
    start_time: Instant,
}

impl Info {
    pub fn new(policy: &'static str) -> Info {
        Info {
            policy,
            episode: 1,
            total_steps: 0,
            episode_rewards: Vec::new(),
            health: HealthState::FULL,
            stats: EpisodeStats::default(),
            session_wins: 0,
            session_losses: 0,
            last_action: "-".to_string(),
            last_round: None,
            paused: false,
            start_time: Instant::now(),
        }
    }

    pub fn record<I>(&mut self, step: &FighterStep<I>, stats: EpisodeStats) {
        self.total_steps += 1;
        self.health = step.health;
        self.stats = stats;
        self.last_action = step.action.to_string();
        match step.round {
            Some(RoundResult::Win) => self.session_wins += 1,
            Some(RoundResult::Loss) => self.session_losses += 1,
            None => {}
        }
        if step.round.is_some() {
            self.last_round = step.round;
        }
        self.episode_rewards
            .push((stats.steps as f64, stats.cumulative_reward));
        // Trimmed in chunks so the chart keeps between one and two histories of points.
        if self.episode_rewards.len() >= 2 * REWARD_HISTORY {
            let excess = self.episode_rewards.len() - REWARD_HISTORY;
            self.episode_rewards.drain(..excess);
        }
    }

    pub fn new_episode(&mut self) {
        self.episode += 1;
        self.episode_rewards.clear();
        self.health = HealthState::FULL;
        self.stats = EpisodeStats::default();
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn session_record(&self) -> (u32, u32) {
        (self.session_wins, self.session_losses)
    }

    fn reward_bounds(&self) -> [f64; 2] {
        let (min, max) = self
            .episode_rewards
            .iter()
            .fold((0.0f64, 0.0f64), |(min, max), (_, reward)| {
                (min.min(*reward), max.max(*reward))
            });
        if max - min < 1.0 {
            [min - 1.0, max + 1.0]
        } else {
            [min, max]
        }
    }

    fn render_rewards(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().title(Span::styled(
            format!("Episode {} reward", self.episode),
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        ));
        let Some(&(last_step, last_reward)) = self.episode_rewards.last() else {
            block.render(area, buf);
            return;
        };
        let first_step = self.episode_rewards.first().map_or(0.0, |(step, _)| *step);
        let [low, high] = self.reward_bounds();
        let datasets = vec![Dataset::default()
            .name(format!("Current: {last_reward:.3}"))
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::LightBlue))
            .data(&self.episode_rewards)];
        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .title("Step")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([first_step, last_step.max(first_step + 1.0)])
                    .labels(vec![
                        Span::styled(
                            format!("{first_step}"),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("{last_step}"),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("Reward")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([low, high])
                    .labels(vec![
                        Span::styled(
                            format!("{low:.1}"),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("{high:.1}"),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                    ]),
            );
        chart.render(area, buf);
    }
}

impl Widget for Info {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        self.render_ref(area, buf)
    }
}

impl WidgetRef for Info {
    fn render_ref(&self, info_area: Rect, buf: &mut Buffer) {
        let [up, down] = Layout::vertical([Constraint::Percentage(60), Constraint::Percentage(40)])
            .areas(info_area);
        self.render_rewards(up, buf);

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
                .areas(down);

        let status = if self.paused { "paused" } else { "running" };
        let last_round = match self.last_round {
            Some(RoundResult::Win) => "won",
            Some(RoundResult::Loss) => "lost",
            None => "-",
        };
        let elapsed = self.start_time.elapsed().as_secs();
        let text = Text::from(vec![
            Line::from(format!("Policy: {} ({status})", self.policy)),
            Line::from(format!("Episode: {}", self.episode)),
            Line::from(format!("Episode steps: {}", self.stats.steps)),
            Line::from(format!("Total steps: {}", self.total_steps)),
            Line::from(format!(
                "Rounds won/lost: {}/{}",
                self.session_wins, self.session_losses
            )),
            Line::from(format!("Last round: {last_round}")),
            Line::from(format!("Last action: {}", self.last_action)),
            Line::from(format!(
                "Elapsed time: {} h {} mins",
                elapsed / 3600,
                (elapsed % 3600) / 60
            )),
        ]);
        Paragraph::new(text)
            .block(Block::bordered().title_top("Info"))
            .render(left, buf);

        let [player, opponent] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(right);
        for (area, title, health, color) in [
            (player, "Player", self.health.player, Color::LightGreen),
            (opponent, "Opponent", self.health.opponent, Color::LightRed),
        ] {
            let ratio = health.clamp(0.0, 1.0);
            Gauge::default()
                .block(Block::bordered().title(title))
                .gauge_style(Style::default().fg(color))
                .ratio(ratio)
                .label(format!("{:.1}%", ratio * 100.0))
                .render(area, buf);
        }
    }
}
