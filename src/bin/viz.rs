use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints, Points};

use riverboat_sim::agent::TransitionBuffer;
use riverboat_sim::control::HeadingPolicy;
use riverboat_sim::sim::{EpisodeSummary, RunMode};
use riverboat_sim::vehicle::BoatSnapshot;
use riverboat_sim::{ScenarioConfig, SimError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ScenarioConfig::default();
    let mut env = config.build_environment()?;
    let dt = env.settings().time_step;
    let agent = env.registry().agent().ok_or(SimError::AgentCount(0))?;
    let mut policy = HeadingPolicy::for_boat(agent, dt)?;
    let mut replay = TransitionBuffer::new(10_000);

    let mode = if env.fixture_rows() > 0 { RunMode::Evaluation { row: 0 } } else { RunMode::Training };
    let summary = env.run_simulation(0, mode, &mut policy, &mut replay)?;

    let history = env.registry().agent().map(|b| b.history().to_vec()).unwrap_or_default();
    let obstacles = env.registry().obstacles().map(|o| ([o.pos.x, o.pos.y], o.radius)).collect();
    let destination = env.destination();

    let app = EpisodeViz {
        history,
        obstacles,
        destination: [destination.x, destination.y],
        summary,
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("River Boat Episode", options, Box::new(|_| Ok(Box::new(app))))
        .map_err(|e| e.to_string())?;
    Ok(())
}

struct EpisodeViz {
    history: Vec<BoatSnapshot>,
    obstacles: Vec<([f64; 2], f64)>,
    destination: [f64; 2],
    summary: EpisodeSummary,
}

fn circle(centre: [f64; 2], radius: f64) -> Vec<[f64; 2]> {
    (0..=64)
        .map(|i| {
            let a = i as f64 / 64.0 * std::f64::consts::TAU;
            [centre[0] + radius * a.cos(), centre[1] + radius * a.sin()]
        })
        .collect()
}

impl eframe::App for EpisodeViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            let s = &self.summary;
            ui.heading("Episode");
            ui.label(format!(
                "Outcome: {:?}  |  Reward: {:.2}  |  Closest approach: {:.1} m  |  Time: {:.1} s",
                s.termination, s.cumulative_reward, s.min_dist, s.time,
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let half_w = available.x / 2.0 - 8.0;
            let half_h = available.y / 2.0 - 8.0;

            ui.horizontal(|ui| {
                // Track in the global frame
                ui.vertical(|ui| {
                    ui.label("Track (m)");
                    let track: PlotPoints = self.history.iter().map(|h| [h.state.pos.x, h.state.pos.y]).collect();
                    Plot::new("track")
                        .width(half_w)
                        .height(available.y - 24.0)
                        .data_aspect(1.0)
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Boat", track));
                            for (i, (centre, radius)) in self.obstacles.iter().enumerate() {
                                plot_ui.line(Line::new(format!("Obstacle {i}"), circle(*centre, *radius)));
                            }
                            plot_ui.points(Points::new("Destination", vec![self.destination]).radius(5.0));
                        });
                });

                ui.vertical(|ui| {
                    // Surge speed vs Time
                    ui.label("Surge speed (m/s)");
                    let points: PlotPoints = self.history.iter().map(|h| [h.time, h.state.vel_local.x]).collect();
                    Plot::new("speed")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("v_xp", points));
                        });

                    // Fuel vs Time
                    ui.label("Fuel (kg)");
                    let points: PlotPoints = self.history.iter().map(|h| [h.time, h.state.fuel]).collect();
                    Plot::new("fuel")
                        .width(half_w)
                        .height(half_h - 24.0)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Fuel", points));
                        });
                });
            });
        });
    }
}
