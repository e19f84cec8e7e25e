//! `image` commands: filters, blending, palettes, grayscale and solarize.
//!
//! Attachments are downloaded through the bridge and processed on the blocking pool.
//! The filter command leaves a button view behind; its component ids have the form
//! `filter:{uuid}:{kind}` and the view goes inactive once nobody has pressed a button
//! for the configured timeout.

mod ops;

pub use ops::FilterKind;

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use image::{DynamicImage, RgbImage};
use lru::LruCache;
use tokio::time::Instant;
use uuid::Uuid;

use crate::errors::AppError;
use crate::messaging::{Button, CommandContext, Embed, InteractionHandle, Messenger, Reply};
use crate::models::{Attachment, Command};
use crate::pagination::PaginatorRegistry;

pub const COMPONENT_PREFIX: &str = "filter";

/// Inactivity window of a filter view.
pub const FILTER_VIEW_TIMEOUT: Duration = Duration::from_secs(35);

const MAX_IMAGE_BYTES: u64 = 8 * 1024 * 1024;
const COLORS_PER_PAGE: usize = 15;

const NOT_ALLOWED: &str = "You do not have permission to interact with this menu.";
const INACTIVE: &str = "This menu is no longer active.";
const TOO_LARGE: &str = "That image is too large.";
const NO_PIXELS: &str = "That image has no pixels.";
const BAD_THRESHOLD: &str = "The threshold must be between 0 and 255.";
const BAD_ALPHA: &str = "The alpha must be a finite number.";

fn component_id(id: Uuid, kind: FilterKind) -> String {
    format!("{}:{}:{}", COMPONENT_PREFIX, id, kind.as_str())
}

/// Split a component id into the filter view id and the filter it asks for.
pub fn parse_component_id(custom_id: &str) -> Option<(Uuid, FilterKind)> {
    let mut parts = custom_id.splitn(3, ':');
    if parts.next()? != COMPONENT_PREFIX {
        return None;
    }
    let id = Uuid::parse_str(parts.next()?).ok()?;
    let kind = FilterKind::parse(parts.next()?)?;
    Some((id, kind))
}

fn filter_buttons(id: Uuid, disabled: bool) -> Vec<Button> {
    FilterKind::ALL
        .iter()
        .map(|kind| Button::labeled(component_id(id, *kind), kind.label()).disabled(disabled))
        .collect()
}

/// One embed per chunk of [`COLORS_PER_PAGE`] colors.
fn color_pages(colors: &[ops::ColorCount]) -> Vec<Embed> {
    let chunks: Vec<&[ops::ColorCount]> = colors.chunks(COLORS_PER_PAGE).collect();
    let total = chunks.len();

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let lines: Vec<String> = chunk
                .iter()
                .map(|c| format!("{} (Count: {})", c.hex(), c.count))
                .collect();
            Embed::text(lines.join("\n")).footer(format!("Page {} / {}", i + 1, total))
        })
        .collect()
}

async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Image(format!("Image worker failed: {}", e)))?
}

struct FilterView {
    author: u64,
    source: Arc<RgbImage>,
    expires_at: Instant,
}

/// Open filter views. Bounded like the paginator registry.
struct FilterViews {
    views: Mutex<LruCache<Uuid, FilterView>>,
}

impl FilterViews {
    fn new(capacity: usize) -> Self {
        Self {
            views: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<Uuid, FilterView>> {
        self.views.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(&self, id: Uuid, view: FilterView) {
        self.lock().put(id, view);
    }

    /// Check the presser and push the expiry back. Returns the source image.
    fn press(&self, id: Uuid, actor_id: u64, timeout: Duration) -> Result<Arc<RgbImage>, AppError> {
        let mut views = self.lock();
        let view = views
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(INACTIVE.to_string()))?;
        if view.author != actor_id {
            return Err(AppError::PermissionDenied(NOT_ALLOWED.to_string()));
        }
        view.expires_at = Instant::now() + timeout;
        Ok(view.source.clone())
    }

    fn expires_at(&self, id: Uuid) -> Option<Instant> {
        self.lock().peek(&id).map(|view| view.expires_at)
    }

    fn remove(&self, id: Uuid) -> bool {
        self.lock().pop(&id).is_some()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }
}

pub struct ImageCommands {
    messenger: Arc<dyn Messenger>,
    paginators: Arc<PaginatorRegistry>,
    views: Arc<FilterViews>,
    view_timeout: Duration,
}

impl ImageCommands {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        paginators: Arc<PaginatorRegistry>,
        view_capacity: usize,
        view_timeout: Duration,
    ) -> Self {
        Self {
            messenger,
            paginators,
            views: Arc::new(FilterViews::new(view_capacity)),
            view_timeout,
        }
    }

    /// Execute an `image` command, answering the user with any error.
    pub async fn run(&self, ctx: &CommandContext, command: Command) -> Result<(), AppError> {
        let name = command.name();
        let result = match command {
            Command::ImageFilter { image } => self.filter(ctx, &image).await,
            Command::ImageBlend {
                image1,
                image2,
                alpha,
            } => self.blend(ctx, &image1, &image2, alpha).await,
            Command::ImageColors { image } => self.colors(ctx, &image).await,
            Command::ImageGrayscale { image } => self.grayscale(ctx, &image).await,
            Command::ImageSolarize { image, threshold } => {
                self.solarize(ctx, &image, threshold).await
            }
            other => Err(AppError::BadRequest(format!(
                "{} is not an image command",
                other.name()
            ))),
        };

        if let Err(err) = &result {
            tracing::debug!(command = name, guild_id = ctx.guild_id, error = %err, "Image command rejected");
            let reply = Reply::text(err.user_message()).ephemeral(true);
            if let Err(send_err) = ctx.reply(self.messenger.as_ref(), reply).await {
                tracing::warn!("Failed to report error for {}: {}", name, send_err);
            }
        }
        result
    }

    /// Download and decode an attachment.
    async fn fetch(&self, attachment: &Attachment) -> Result<DynamicImage, AppError> {
        if attachment.size > MAX_IMAGE_BYTES {
            return Err(AppError::InvalidInput(TOO_LARGE.to_string()));
        }
        let bytes = self.messenger.download(&attachment.url).await?;
        if bytes.len() as u64 > MAX_IMAGE_BYTES {
            return Err(AppError::InvalidInput(TOO_LARGE.to_string()));
        }
        tracing::debug!(filename = %attachment.filename, bytes = bytes.len(), "Downloaded attachment");
        run_blocking(move || ops::decode(&bytes)).await
    }

    /// `image filter`: post the image with one button per filter.
    pub async fn filter(&self, ctx: &CommandContext, image: &Attachment) -> Result<(), AppError> {
        let decoded = self.fetch(image).await?;
        let (source, preview) = run_blocking(move || {
            let source = decoded.to_rgb8();
            let preview = ops::encode_jpeg(DynamicImage::ImageRgb8(source.clone()))?;
            Ok((source, preview))
        })
        .await?;

        let id = Uuid::new_v4();
        self.views.insert(
            id,
            FilterView {
                author: ctx.actor.id,
                source: Arc::new(source),
                expires_at: Instant::now() + self.view_timeout,
            },
        );

        let reply = Reply::file("processed_image.jpg", preview).buttons(filter_buttons(id, false));
        if let Err(e) = ctx.reply(self.messenger.as_ref(), reply).await {
            self.views.remove(id);
            return Err(e);
        }

        tracing::debug!(view_id = %id, guild_id = ctx.guild_id, "Opened filter view");
        self.expire_later(id, ctx.interaction.clone());
        Ok(())
    }

    /// Disable the view's buttons once it has been idle for the timeout.
    fn expire_later(&self, id: Uuid, interaction: InteractionHandle) {
        let views = self.views.clone();
        let messenger = self.messenger.clone();

        tokio::spawn(async move {
            let mut deadline = Instant::now();
            loop {
                match views.expires_at(id) {
                    // Evicted by newer views; nothing left to edit.
                    None => return,
                    Some(expires_at) if expires_at > deadline => {
                        deadline = expires_at;
                        tokio::time::sleep_until(deadline).await;
                    }
                    Some(_) => break,
                }
            }

            if !views.remove(id) {
                return;
            }
            tracing::debug!(view_id = %id, "Filter view timed out");
            let reply = Reply::default().buttons(filter_buttons(id, true));
            if let Err(e) = messenger.edit_original(&interaction, reply).await {
                tracing::warn!("Failed to disable filter view {}: {}", id, e);
            }
        });
    }

    /// Apply the filter a button names to the view's original image.
    pub async fn press(&self, custom_id: &str, actor_id: u64) -> Result<Reply, AppError> {
        let (id, kind) = parse_component_id(custom_id)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown component: {}", custom_id)))?;
        let source = self.views.press(id, actor_id, self.view_timeout)?;

        let output = run_blocking(move || {
            ops::encode_jpeg(DynamicImage::ImageRgb8(ops::apply_filter(&source, kind)))
        })
        .await?;

        tracing::debug!(view_id = %id, filter = kind.as_str(), "Applied filter");
        Ok(Reply::file("processed_image.jpg", output).buttons(filter_buttons(id, false)))
    }

    /// `image blend`: interpolate between two images with a constant alpha.
    pub async fn blend(
        &self,
        ctx: &CommandContext,
        image1: &Attachment,
        image2: &Attachment,
        alpha: f32,
    ) -> Result<(), AppError> {
        if !alpha.is_finite() {
            return Err(AppError::InvalidInput(BAD_ALPHA.to_string()));
        }
        let (first, second) = tokio::try_join!(self.fetch(image1), self.fetch(image2))?;

        let output = run_blocking(move || {
            let blended = ops::blend(&first.to_rgb8(), &second.to_rgb8(), alpha);
            ops::encode_jpeg(DynamicImage::ImageRgb8(blended))
        })
        .await?;

        ctx.reply(
            self.messenger.as_ref(),
            Reply::file("blended_image.jpg", output),
        )
        .await
    }

    /// `image colors`: paginated list of the web-safe colors in an image.
    pub async fn colors(&self, ctx: &CommandContext, image: &Attachment) -> Result<(), AppError> {
        let decoded = self.fetch(image).await?;
        let colors = run_blocking(move || Ok(ops::palette(&decoded.to_rgb8()))).await?;
        if colors.is_empty() {
            return Err(AppError::InvalidInput(NO_PIXELS.to_string()));
        }

        let reply = self
            .paginators
            .open(color_pages(&colors), 0, Some(ctx.actor.id))?;
        ctx.reply(self.messenger.as_ref(), reply).await
    }

    /// `image grayscale`
    pub async fn grayscale(&self, ctx: &CommandContext, image: &Attachment) -> Result<(), AppError> {
        let decoded = self.fetch(image).await?;
        let output = run_blocking(move || {
            ops::encode_jpeg(DynamicImage::ImageLuma8(ops::grayscale(&decoded)))
        })
        .await?;

        ctx.reply(
            self.messenger.as_ref(),
            Reply::file("grayscale_image.jpg", output),
        )
        .await
    }

    /// `image solarize`: invert every channel value at or above the threshold.
    pub async fn solarize(
        &self,
        ctx: &CommandContext,
        image: &Attachment,
        threshold: i64,
    ) -> Result<(), AppError> {
        let threshold = u8::try_from(threshold)
            .map_err(|_| AppError::InvalidInput(BAD_THRESHOLD.to_string()))?;
        let decoded = self.fetch(image).await?;
        let output = run_blocking(move || {
            ops::encode_jpeg(DynamicImage::ImageRgb8(ops::solarize(&decoded, threshold)))
        })
        .await?;

        ctx.reply(
            self.messenger.as_ref(),
            Reply::file("solarize_image.jpg", output),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{actor, context, RecordingMessenger, Sent};
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    const URL: &str = "https://cdn.example/image.png";

    fn png(image: RgbImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn attachment(url: &str) -> Attachment {
        Attachment {
            url: url.to_string(),
            filename: "image.png".to_string(),
            size: 0,
        }
    }

    fn setup(view_timeout: Duration) -> (Arc<RecordingMessenger>, Arc<PaginatorRegistry>, ImageCommands) {
        let messenger = Arc::new(RecordingMessenger::new());
        let paginators = Arc::new(PaginatorRegistry::new(10));
        let images = ImageCommands::new(messenger.clone(), paginators.clone(), 10, view_timeout);
        (messenger, paginators, images)
    }

    fn first_reply(messenger: &RecordingMessenger) -> Reply {
        match messenger.sent().into_iter().next() {
            Some(Sent::Respond(reply)) => reply,
            other => panic!("expected a response, got {:?}", other),
        }
    }

    fn decoded_file(reply: &Reply) -> DynamicImage {
        ops::decode(&reply.files[0].data).unwrap()
    }

    #[test]
    fn test_component_ids() {
        let id = Uuid::new_v4();
        let custom_id = component_id(id, FilterKind::EdgeEnhanceMore);
        assert_eq!(
            parse_component_id(&custom_id),
            Some((id, FilterKind::EdgeEnhanceMore))
        );
        assert_eq!(parse_component_id(&format!("paginator:{}:next", id)), None);
        assert_eq!(parse_component_id(&format!("filter:{}:sepia", id)), None);
    }

    #[tokio::test]
    async fn test_filter_opens_view_and_applies_on_press() {
        let (messenger, _, images) = setup(FILTER_VIEW_TIMEOUT);
        messenger.add_file(URL, png(RgbImage::from_pixel(8, 6, Rgb([90, 90, 90]))));
        let ctx = context(actor(1));

        images
            .run(&ctx, Command::ImageFilter { image: attachment(URL) })
            .await
            .unwrap();

        let reply = first_reply(&messenger);
        assert_eq!(reply.files[0].filename, "processed_image.jpg");
        assert_eq!(reply.buttons.len(), 10);
        assert_eq!(reply.buttons[4].label.as_deref(), Some("Edge Enhance More"));
        assert!(reply.buttons.iter().all(|b| !b.disabled));
        assert_eq!(images.views.len(), 1);

        let emboss = reply.buttons[5].custom_id.clone();
        let err = images.press(&emboss, 2).await.unwrap_err();
        assert_eq!(err.message(), NOT_ALLOWED);

        let update = images.press(&emboss, 1).await.unwrap();
        assert_eq!(update.files[0].filename, "processed_image.jpg");
        assert_eq!(update.buttons, reply.buttons);
        let filtered = decoded_file(&update);
        assert_eq!((filtered.width(), filtered.height()), (8, 6));
    }

    #[tokio::test]
    async fn test_filter_view_times_out_and_disables_buttons() {
        let (messenger, _, images) = setup(Duration::from_millis(50));
        messenger.add_file(URL, png(RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]))));
        let ctx = context(actor(1));

        images
            .run(&ctx, Command::ImageFilter { image: attachment(URL) })
            .await
            .unwrap();
        let blur = first_reply(&messenger).buttons[0].custom_id.clone();

        tokio::time::sleep(Duration::from_millis(300)).await;

        match messenger.sent().last() {
            Some(Sent::EditOriginal(reply)) => {
                assert_eq!(reply.buttons.len(), 10);
                assert!(reply.buttons.iter().all(|b| b.disabled));
            }
            other => panic!("expected the view to be disabled, got {:?}", other),
        }
        let err = images.press(&blur, 1).await.unwrap_err();
        assert_eq!(err.message(), INACTIVE);
    }

    #[tokio::test]
    async fn test_blend_sends_first_image_size() {
        let (messenger, _, images) = setup(FILTER_VIEW_TIMEOUT);
        messenger.add_file("https://cdn/a.png", png(RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]))));
        messenger.add_file("https://cdn/b.png", png(RgbImage::from_pixel(4, 2, Rgb([255, 255, 255]))));
        let ctx = context(actor(1));

        images
            .run(
                &ctx,
                Command::ImageBlend {
                    image1: attachment("https://cdn/a.png"),
                    image2: attachment("https://cdn/b.png"),
                    alpha: 0.5,
                },
            )
            .await
            .unwrap();

        let reply = first_reply(&messenger);
        assert_eq!(reply.files[0].filename, "blended_image.jpg");
        let blended = decoded_file(&reply).to_rgb8();
        assert_eq!(blended.dimensions(), (8, 8));
        let value = blended.get_pixel(4, 4).0[0];
        assert!((118..=138).contains(&value), "unexpected blend value {}", value);
    }

    #[tokio::test]
    async fn test_colors_opens_author_locked_paginator() {
        let (messenger, paginators, images) = setup(FILTER_VIEW_TIMEOUT);
        let image = RgbImage::from_fn(20, 1, |x, _| Rgb([(x % 6 * 51) as u8, (x / 6 * 51) as u8, 0]));
        messenger.add_file(URL, png(image));
        let ctx = context(actor(1));

        images
            .run(&ctx, Command::ImageColors { image: attachment(URL) })
            .await
            .unwrap();

        let reply = first_reply(&messenger);
        let page = &reply.embeds[0];
        assert_eq!(page.footer.as_deref(), Some("Page 1 / 2"));
        let description = page.description.as_deref().unwrap();
        assert_eq!(description.lines().count(), 15);
        assert_eq!(description.lines().next(), Some("#000000 (Count: 1)"));
        assert_eq!(paginators.len(), 1);

        let err = paginators
            .handle(&reply.buttons[2].custom_id, 2, None)
            .unwrap_err();
        assert_eq!(err.message(), NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_grayscale_sends_gray_jpeg() {
        let (messenger, _, images) = setup(FILTER_VIEW_TIMEOUT);
        messenger.add_file(URL, png(RgbImage::from_pixel(3, 3, Rgb([200, 50, 50]))));
        let ctx = context(actor(1));

        images
            .run(&ctx, Command::ImageGrayscale { image: attachment(URL) })
            .await
            .unwrap();

        let reply = first_reply(&messenger);
        assert_eq!(reply.files[0].filename, "grayscale_image.jpg");
        assert_eq!(decoded_file(&reply).color(), image::ColorType::L8);
    }

    #[tokio::test]
    async fn test_solarize_checks_threshold_before_download() {
        let (messenger, _, images) = setup(FILTER_VIEW_TIMEOUT);
        let ctx = context(actor(1));

        let err = images
            .run(
                &ctx,
                Command::ImageSolarize {
                    image: attachment(URL),
                    threshold: 256,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(messenger.last_text().as_deref(), Some(BAD_THRESHOLD));
        assert!(first_reply(&messenger).ephemeral);

        messenger.add_file(URL, png(RgbImage::from_pixel(2, 2, Rgb([250, 250, 250]))));
        let ctx = context(actor(1));
        images
            .run(
                &ctx,
                Command::ImageSolarize {
                    image: attachment(URL),
                    threshold: 128,
                },
            )
            .await
            .unwrap();
        match messenger.sent().last() {
            Some(Sent::Respond(reply)) => {
                assert_eq!(reply.files[0].filename, "solarize_image.jpg");
                let value = decoded_file(reply).to_rgb8().get_pixel(0, 0).0[0];
                assert!(value < 16, "expected an inverted pixel, got {}", value);
            }
            other => panic!("expected a response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreadable_and_oversized_attachments() {
        let (messenger, _, images) = setup(FILTER_VIEW_TIMEOUT);
        messenger.add_file(URL, b"plain text, not pixels".to_vec());
        let ctx = context(actor(1));

        assert!(images
            .run(&ctx, Command::ImageGrayscale { image: attachment(URL) })
            .await
            .is_err());
        assert_eq!(messenger.last_text().as_deref(), Some(ops::NOT_AN_IMAGE));

        let huge = Attachment {
            size: MAX_IMAGE_BYTES + 1,
            ..attachment("https://cdn/never-fetched.png")
        };
        let ctx = context(actor(1));
        assert!(images
            .run(&ctx, Command::ImageColors { image: huge })
            .await
            .is_err());
        assert_eq!(messenger.last_text().as_deref(), Some(TOO_LARGE));
    }
}
