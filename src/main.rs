use clap::Parser;
use iced::widget::{button, canvas, column, container, pick_list, row, slider, text, text_input, Column};
use iced::{window, Alignment, Element, Length, Size, Subscription, Task, Theme};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod state;
mod ui;

use api::{ApiClient, FetchError};
use config::Config;
use state::data::{Identifier, RunSummary, Track, TrackList};
use state::session::{LoadRequest, RunOption, Session, Ticket, TracksRequest};
use ui::canvas::TrackCanvas;
use ui::render::{self, Viewport};

/// Space around the window content, in logical pixels
const PADDING: f32 = 20.0;

/// Main application state
struct TrackViewer {
    /// Connection to the track service
    client: ApiClient,
    /// Selections, loaded track and status text
    session: Session,
    /// Size of the track canvas
    viewport: Viewport,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// Run listing finished
    RunsLoaded(Result<Vec<RunSummary>, FetchError>),
    /// User picked a run
    RunSelected(RunOption),
    /// Track listing for a run finished
    TracksLoaded(Ticket, Result<TrackList, FetchError>),
    /// User picked a track
    TrackSelected(Identifier),
    /// User edited the sample stride field
    SampleChanged(String),
    /// User clicked "Load"
    LoadPressed,
    /// Track fetch finished
    TrackLoaded(Ticket, Result<Track, FetchError>),
    /// Scrub slider moved
    Scrubbed(u32),
    /// Relative frame step (mouse wheel over the canvas)
    Step(i32),
    /// Window size changed
    WindowResized(Size),
    /// Device pixel ratio reported by the window
    ScaleFactorChanged(f32),
}

impl TrackViewer {
    /// Create a new instance of the application
    fn new(config: Config) -> (Self, Task<Message>) {
        let client = ApiClient::new(config.server.clone());
        let mut session = Session::new(config.sample_stride());
        session.runs_loading();

        let viewport = Viewport::new(Size::new(640.0, 480.0));

        let runs = {
            let client = client.clone();
            Task::perform(async move { client.list_runs().await }, Message::RunsLoaded)
        };

        let window_metrics = window::get_oldest().and_then(|id| {
            Task::batch([
                window::get_scale_factor(id).map(Message::ScaleFactorChanged),
                window::get_size(id).map(Message::WindowResized),
            ])
        });

        (
            TrackViewer {
                client,
                session,
                viewport,
            },
            Task::batch([runs, window_metrics]),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::RunsLoaded(result) => match self.session.runs_loaded(result) {
                Some(request) => self.fetch_tracks(request),
                None => Task::none(),
            },
            Message::RunSelected(run) => {
                let request = self.session.select_run(run.id);
                self.fetch_tracks(request)
            }
            Message::TracksLoaded(ticket, result) => {
                self.session.tracks_loaded(ticket, result);
                Task::none()
            }
            Message::TrackSelected(track) => {
                self.session.select_track(track);
                Task::none()
            }
            Message::SampleChanged(value) => {
                self.session.set_sample_input(value);
                Task::none()
            }
            Message::LoadPressed => match self.session.begin_load() {
                Some(request) => self.fetch_track(request),
                None => Task::none(),
            },
            Message::TrackLoaded(ticket, result) => {
                if self.session.finish_load(ticket, result) {
                    self.fit_canvas();
                }
                Task::none()
            }
            Message::Scrubbed(index) => {
                self.session.scrub_to(index as usize);
                Task::none()
            }
            Message::Step(delta) => {
                self.session.step(delta);
                Task::none()
            }
            Message::WindowResized(size) => {
                let border = self.viewport.border.map_or(0.0, |b| b.width);
                self.viewport.display.width = (size.width - 2.0 * (PADDING + border)).max(1.0);
                self.fit_canvas();
                Task::none()
            }
            Message::ScaleFactorChanged(ratio) => {
                tracing::debug!(ratio, "scale factor");
                self.viewport.device_pixel_ratio = Some(ratio);
                self.fit_canvas();
                Task::none()
            }
        }
    }

    fn fit_canvas(&mut self) {
        let shape = self.session.track().map(|track| &track.image);
        render::resize_canvas(&mut self.viewport, shape);
        tracing::debug!(
            width = self.viewport.display.width,
            height = self.viewport.display.height,
            buffer = ?self.viewport.buffer,
            "canvas resized"
        );
    }

    fn fetch_tracks(&self, request: TracksRequest) -> Task<Message> {
        let client = self.client.clone();
        let TracksRequest { ticket, run } = request;

        Task::perform(
            async move { client.list_tracks(&run).await },
            move |result| Message::TracksLoaded(ticket, result),
        )
    }

    fn fetch_track(&self, request: LoadRequest) -> Task<Message> {
        let client = self.client.clone();
        let LoadRequest {
            ticket,
            run,
            track,
            sample,
        } = request;

        Task::perform(
            async move { client.fetch_track(&run, &track, sample).await },
            move |result| Message::TrackLoaded(ticket, result),
        )
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let controls = row![
            pick_list(
                self.session.runs(),
                self.session.selected_run(),
                Message::RunSelected
            )
            .placeholder("Run"),
            pick_list(
                self.session.tracks(),
                self.session.selected_track(),
                Message::TrackSelected
            )
            .placeholder("Track"),
            text_input("Sample", self.session.sample_input())
                .on_input(Message::SampleChanged)
                .on_submit(Message::LoadPressed)
                .width(Length::Fixed(80.0)),
            button("Load")
                .on_press(Message::LoadPressed)
                .padding(10),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let scrub = slider(
            0..=self.session.scrub_max() as u32,
            self.session.frame_index() as u32,
            Message::Scrubbed,
        );

        let track_canvas = canvas(TrackCanvas {
            track: self.session.track(),
            frame_index: self.session.frame_index(),
        })
        .width(Length::Fixed(self.viewport.display.width))
        .height(Length::Fixed(self.viewport.display.height));

        let border = self.viewport.border;
        let framed = container(track_canvas)
            .padding(border.map_or(0.0, |b| b.width))
            .style(move |_theme: &Theme| container::Style {
                border: border.unwrap_or_default(),
                ..container::Style::default()
            });

        let content: Column<Message> = column![
            controls,
            scrub,
            text(self.session.status()).size(16),
            text(self.session.info()).size(16),
            framed,
        ]
        .spacing(12)
        .padding(PADDING);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        window::resize_events().map(|(_id, size)| Message::WindowResized(size))
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> iced::Result {
    let config = Config::parse();
    init_logging();

    tracing::info!(
        server = %config.server,
        sample = config.sample_stride().get(),
        "Track Viewer v{}",
        env!("CARGO_PKG_VERSION")
    );

    iced::application("Track Viewer", TrackViewer::update, TrackViewer::view)
        .subscription(TrackViewer::subscription)
        .theme(TrackViewer::theme)
        .centered()
        .run_with(move || TrackViewer::new(config))
}
