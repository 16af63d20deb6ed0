use iced::alignment::Horizontal;
use iced::widget::button as button_widget;
use iced::widget::container as container_widget;
use iced::widget::{button, column, container, image, pick_list, row, scrollable, text, text_input, Column, Row};
use iced::{theme, Alignment, Background, Color, Command, Element, Length, Theme};

use disk_imager::client::{inspect_image, ImageClient};
use disk_imager::config::Config;
use disk_imager::error::GenerateError;
use disk_imager::params::{Field, ParameterRecord, Psf};
use disk_imager::state::{FormState, Outcome, Ticket};

const FIELDS_PER_ROW: usize = 4;
const PREVIEW_SIZE: f32 = 384.0;

fn color_bg() -> Color {
    Color::from_rgb8(10, 12, 16)
}

fn color_surface() -> Color {
    Color::from_rgb8(20, 26, 34)
}

fn color_surface_alt() -> Color {
    Color::from_rgb8(26, 34, 44)
}

fn color_border() -> Color {
    Color::from_rgb8(40, 52, 66)
}

fn color_text() -> Color {
    Color::from_rgb8(236, 242, 248)
}

fn color_muted() -> Color {
    Color::from_rgb8(150, 168, 186)
}

fn color_accent() -> Color {
    Color::from_rgb8(59, 130, 246)
}

fn color_danger() -> Color {
    Color::from_rgb8(239, 68, 68)
}

#[derive(Debug, Clone)]
pub enum Message {
    FieldChanged(Field, String),
    PsfSelected(Psf),
    Generate,
    Generated(Ticket, Result<Vec<u8>, GenerateError>),
    PlaceholderLoaded(Result<Vec<u8>, GenerateError>),
    SaveImage,
    ImageSaved(Result<Option<String>, String>),
}

pub struct App {
    state: FormState,
    client: ImageClient,
    preview: Option<image::Handle>,
    status: String,
    failed: bool,
}

impl iced::Application for App {
    type Executor = iced::executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = Config;

    fn new(config: Config) -> (Self, Command<Self::Message>) {
        let app = App {
            state: FormState::new(config.placeholder_url.clone(), config.policy),
            client: ImageClient::new(config.endpoint),
            preview: None,
            status: "Idle".to_string(),
            failed: false,
        };
        let client = app.client.clone();
        let url = config.placeholder_url;
        (
            app,
            Command::perform(async move { client.fetch(&url).await }, Message::PlaceholderLoaded),
        )
    }

    fn title(&self) -> String {
        "Image Generator".to_string()
    }

    fn update(&mut self, message: Self::Message) -> Command<Self::Message> {
        match message {
            Message::FieldChanged(field, raw) => {
                self.state.apply_edit(field, raw);
                Command::none()
            }
            Message::PsfSelected(psf) => {
                self.state.apply_edit(Field::Psf, psf.to_string());
                Command::none()
            }
            Message::Generate => match self.state.begin_generate() {
                Ok((ticket, payload)) => {
                    self.set_status(format!("Generating... ({} in flight)", self.state.in_flight()), false);
                    let client = self.client.clone();
                    Command::perform(async move { client.generate(&payload).await }, move |result| {
                        Message::Generated(ticket, result)
                    })
                }
                Err(e) => {
                    log::warn!("not sending request: {}", e);
                    self.set_status(format!("Error: {}", e), true);
                    Command::none()
                }
            },
            Message::Generated(ticket, result) => {
                match self.state.apply_generate_result(ticket, result) {
                    Outcome::Applied => {
                        let bytes = self.state.display().local_bytes().unwrap_or_default();
                        let info = inspect_image(bytes);
                        self.preview = Some(image::Handle::from_memory(bytes.to_vec()));
                        let at = chrono::Local::now().format("%H:%M:%S");
                        let mut status = match info {
                            Some(info) => format!("Generated {}x{} at {}", info.width, info.height, at),
                            None => {
                                log::warn!("response #{} is not a decodable image", ticket.seq());
                                format!("Generated at {} (response is not a readable image)", at)
                            }
                        };
                        if self.state.in_flight() > 0 {
                            status.push_str(&format!(", {} still in flight", self.state.in_flight()));
                        }
                        log::info!("request #{} displayed as {}", ticket.seq(), self.state.display().url());
                        self.set_status(status, false);
                    }
                    Outcome::Stale => {
                        self.set_status(format!("Discarded stale result #{}", ticket.seq()), false);
                    }
                    Outcome::Failed(e) => {
                        log::warn!("request #{} failed: {}", ticket.seq(), e);
                        self.set_status(format!("Error: {}", e), true);
                    }
                }
                Command::none()
            }
            Message::PlaceholderLoaded(result) => {
                match result {
                    Ok(bytes) => {
                        if self.state.display().local_bytes().is_none() {
                            self.preview = Some(image::Handle::from_memory(bytes));
                        }
                    }
                    Err(e) => log::warn!("placeholder {} unavailable: {}", self.state.display().url(), e),
                }
                Command::none()
            }
            Message::SaveImage => {
                let Some(bytes) = self.state.display().local_bytes().map(|b| b.to_vec()) else {
                    return Command::none();
                };
                Command::perform(save_image(bytes), Message::ImageSaved)
            }
            Message::ImageSaved(result) => {
                match result {
                    Ok(Some(path)) => self.set_status(format!("Saved {}", path), false),
                    Ok(None) => {}
                    Err(e) => {
                        log::warn!("save failed: {}", e);
                        self.set_status(format!("Save error: {}", e), true);
                    }
                }
                Command::none()
            }
        }
    }

    fn view(&self) -> Element<'_, Self::Message> {
        let params = self.state.params();

        let preview: Element<'_, Message> = match &self.preview {
            Some(handle) => image(handle.clone()).width(Length::Fill).height(Length::Fill).into(),
            None => text("Generated").style(color_muted()).into(),
        };
        let frame = container(preview)
            .width(Length::Fixed(PREVIEW_SIZE))
            .height(Length::Fixed(PREVIEW_SIZE))
            .padding(8)
            .center_x()
            .center_y()
            .style(theme::Container::from(frame_style));

        let generate = button(
            text("Generate Image")
                .width(Length::Fill)
                .horizontal_alignment(Horizontal::Center),
        )
        .width(Length::Fill)
        .padding([10, 16])
        .style(theme::Button::Custom(Box::new(PrimaryButton)))
        .on_press(Message::Generate);

        let mut save = button("Save Image")
            .padding([6, 12])
            .style(theme::Button::Custom(Box::new(GhostButton)));
        if self.state.display().local_bytes().is_some() {
            save = save.on_press(Message::SaveImage);
        }

        let status = text(&self.status).style(if self.failed { color_danger() } else { color_muted() });

        let form = column![
            section("Disk Parameters", input_fields(params, &Field::DISK)),
            section("SPF Parameters", input_fields(params, &Field::SPF)),
            section("PSF Choice", vec![psf_selector(params)]),
            section("Parallactic Angles", input_fields(params, &Field::PARALLACTIC)),
        ]
        .spacing(24);

        let content = column![
            text("Image Generator").size(28).style(color_text()),
            frame,
            generate,
            row![status, save].spacing(16).align_items(Alignment::Center),
            form,
        ]
        .spacing(18)
        .padding(16)
        .max_width(720.0)
        .align_items(Alignment::Center);

        container(scrollable(container(content).width(Length::Fill).center_x()))
            .width(Length::Fill)
            .height(Length::Fill)
            .style(theme::Container::from(body_style))
            .into()
    }
}

impl App {
    fn set_status(&mut self, status: String, failed: bool) {
        self.status = status;
        self.failed = failed;
    }
}

async fn save_image(bytes: Vec<u8>) -> Result<Option<String>, String> {
    let ext = inspect_image(&bytes)
        .and_then(|info| info.format.extensions_str().first().copied())
        .unwrap_or("png");
    let Some(handle) = rfd::AsyncFileDialog::new()
        .add_filter("Image", &[ext])
        .set_file_name(format!("disk.{ext}"))
        .save_file()
        .await
    else {
        return Ok(None);
    };
    let path = handle.path().to_path_buf();
    std::fs::write(&path, &bytes).map_err(|e| e.to_string())?;
    Ok(Some(path.display().to_string()))
}

fn section<'a>(title: &str, children: Vec<Element<'a, Message>>) -> Element<'a, Message> {
    let mut rows = Column::new().spacing(12);
    let mut children = children.into_iter().peekable();
    while children.peek().is_some() {
        let chunk: Vec<Element<'a, Message>> = children.by_ref().take(FIELDS_PER_ROW).collect();
        rows = rows.push(container(Row::with_children(chunk).spacing(16)).width(Length::Fill).center_x());
    }
    card(title, rows)
}

fn input_fields<'a>(params: &ParameterRecord, fields: &[Field]) -> Vec<Element<'a, Message>> {
    fields.iter().map(|&f| input_field(f, params.get(f))).collect()
}

fn input_field<'a>(field: Field, value: &str) -> Element<'a, Message> {
    column![
        text(field.label()).size(14).style(color_text()),
        text_input(field.key(), value)
            .id(text_input::Id::new(field.key()))
            .on_input(move |raw| Message::FieldChanged(field, raw))
            .padding(8)
            .width(Length::Fixed(120.0)),
    ]
    .spacing(6)
    .align_items(Alignment::Center)
    .into()
}

fn psf_selector<'a>(params: &ParameterRecord) -> Element<'a, Message> {
    pick_list(Psf::ALL.to_vec(), params.psf(), Message::PsfSelected)
        .padding(8)
        .into()
}

fn card<'a>(title: &str, content: Column<'a, Message>) -> Element<'a, Message> {
    container(
        column![
            container(text(title).size(18).style(color_text()))
                .padding([6, 10])
                .width(Length::Fill)
                .style(theme::Container::from(header_style)),
            content.spacing(12),
        ]
        .spacing(12),
    )
    .padding(14)
    .width(Length::Fill)
    .style(theme::Container::from(card_style))
    .into()
}

fn header_style(_theme: &Theme) -> container_widget::Appearance {
    container_widget::Appearance {
        background: Some(Background::Color(color_surface_alt())),
        text_color: Some(color_text()),
        border_radius: 10.0.into(),
        border_width: 1.0,
        border_color: color_border(),
    }
}

fn card_style(_theme: &Theme) -> container_widget::Appearance {
    container_widget::Appearance {
        background: Some(Background::Color(color_surface())),
        text_color: Some(color_text()),
        border_radius: 14.0.into(),
        border_width: 1.0,
        border_color: color_border(),
    }
}

fn frame_style(_theme: &Theme) -> container_widget::Appearance {
    container_widget::Appearance {
        background: Some(Background::Color(color_surface_alt())),
        text_color: Some(color_muted()),
        border_radius: 8.0.into(),
        border_width: 1.0,
        border_color: color_border(),
    }
}

fn body_style(_theme: &Theme) -> container_widget::Appearance {
    container_widget::Appearance {
        background: Some(Background::Color(color_bg())),
        text_color: Some(color_text()),
        ..Default::default()
    }
}

struct PrimaryButton;

impl button_widget::StyleSheet for PrimaryButton {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> button_widget::Appearance {
        button_widget::Appearance {
            background: Some(Background::Color(color_accent())),
            text_color: Color::WHITE,
            border_radius: 6.0.into(),
            border_width: 1.0,
            border_color: color_accent(),
            ..Default::default()
        }
    }

    fn hovered(&self, style: &Self::Style) -> button_widget::Appearance {
        let mut active = self.active(style);
        active.background = Some(Background::Color(Color::from_rgb8(96, 165, 250)));
        active
    }

    fn pressed(&self, style: &Self::Style) -> button_widget::Appearance {
        let mut active = self.active(style);
        active.background = Some(Background::Color(Color::from_rgb8(37, 99, 235)));
        active
    }
}

struct GhostButton;

impl button_widget::StyleSheet for GhostButton {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> button_widget::Appearance {
        button_widget::Appearance {
            background: Some(Background::Color(color_surface_alt())),
            text_color: color_text(),
            border_radius: 10.0.into(),
            border_width: 1.0,
            border_color: color_border(),
            ..Default::default()
        }
    }

    fn hovered(&self, style: &Self::Style) -> button_widget::Appearance {
        let mut active = self.active(style);
        active.background = Some(Background::Color(Color::from_rgb8(36, 46, 60)));
        active
    }

    fn pressed(&self, style: &Self::Style) -> button_widget::Appearance {
        let mut active = self.active(style);
        active.background = Some(Background::Color(Color::from_rgb8(28, 38, 50)));
        active
    }

    fn disabled(&self, style: &Self::Style) -> button_widget::Appearance {
        let mut active = self.active(style);
        active.text_color = color_muted();
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disk_imager::config::DEFAULT_PLACEHOLDER;
    use iced::Application;

    fn app() -> App {
        App::new(Config::default()).0
    }

    #[test]
    fn test_starts_on_placeholder() {
        let app = app();
        assert_eq!(app.state.display().url(), DEFAULT_PLACEHOLDER);
        assert_eq!(app.state.params(), &ParameterRecord::default());
        assert_eq!(app.status, "Idle");
        assert_eq!(app.title(), "Image Generator");
    }

    #[test]
    fn test_field_and_psf_messages_edit_record() {
        let mut app = app();
        let _ = app.update(Message::FieldChanged(Field::XCenter, "12.5".to_string()));
        let _ = app.update(Message::PsfSelected(Psf::Nircam300Fm));
        let expected = ParameterRecord::default()
            .with_field(Field::XCenter, "12.5")
            .with_field(Field::Psf, "NIRCAM 300FM");
        assert_eq!(app.state.params(), &expected);
    }

    #[test]
    fn test_generated_messages() {
        let mut app = app();
        let _ = app.update(Message::FieldChanged(Field::Sma, "oops".to_string()));
        let _ = app.update(Message::Generate);
        assert!(app.failed);
        assert!(app.status.starts_with("Error: sma"));
        assert_eq!(app.state.in_flight(), 0);

        let _ = app.update(Message::FieldChanged(Field::Sma, "50".to_string()));
        let _ = app.update(Message::Generate);
        assert_eq!(app.state.in_flight(), 1);
        assert!(app.status.starts_with("Generating..."));

        let (ticket, _) = app.state.begin_generate().unwrap();
        let _ = app.update(Message::Generated(ticket, Err(GenerateError::Status { code: 502 })));
        assert_eq!(app.status, "Error: server answered 502");
        assert_eq!(app.state.display().url(), DEFAULT_PLACEHOLDER);

        let (ticket, _) = app.state.begin_generate().unwrap();
        let _ = app.update(Message::Generated(ticket, Ok(b"not an image".to_vec())));
        assert!(!app.failed);
        assert!(app.preview.is_some());
        assert!(app.state.display().url().starts_with("blob:"));
        assert!(app.status.contains("not a readable image"));
    }

    #[test]
    fn test_status_keeps_in_flight_count() {
        let mut app = app();
        let (first, _) = app.state.begin_generate().unwrap();
        let (second, _) = app.state.begin_generate().unwrap();
        let _ = app.update(Message::Generated(second, Ok(b"second".to_vec())));
        assert!(app.status.ends_with(", 1 still in flight"), "{}", app.status);
        let _ = app.update(Message::Generated(first, Ok(b"first".to_vec())));
        assert!(!app.status.contains("in flight"), "{}", app.status);
        assert_eq!(app.state.display().local_bytes(), Some(&b"first"[..]));
    }

    #[test]
    fn test_placeholder_failure_leaves_alt_text() {
        let mut app = app();
        let _ = app.update(Message::PlaceholderLoaded(Err(GenerateError::Transport("dns error".into()))));
        assert!(app.preview.is_none());
        assert_eq!(app.state.display().url(), DEFAULT_PLACEHOLDER);
        assert!(!app.failed);
    }

    #[test]
    fn test_late_placeholder_does_not_replace_generated_image() {
        let mut app = app();
        let (ticket, _) = app.state.begin_generate().unwrap();
        let _ = app.update(Message::Generated(ticket, Ok(b"generated".to_vec())));
        let generated = app.preview.as_ref().map(|h| h.id());
        assert_eq!(generated, Some(image::Handle::from_memory(b"generated".to_vec()).id()));

        let _ = app.update(Message::PlaceholderLoaded(Ok(b"placeholder".to_vec())));
        assert_eq!(app.preview.as_ref().map(|h| h.id()), generated);
        assert_eq!(app.state.display().local_bytes(), Some(&b"generated"[..]));
    }

    #[test]
    fn test_placeholder_shown_before_first_result() {
        let mut app = app();
        let _ = app.update(Message::PlaceholderLoaded(Ok(b"placeholder".to_vec())));
        assert_eq!(
            app.preview.as_ref().map(|h| h.id()),
            Some(image::Handle::from_memory(b"placeholder".to_vec()).id())
        );
    }
}
