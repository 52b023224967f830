//! Live media streams.
//!
//! A surface that can be captured owns a [`FrameFeed`] and publishes every
//! frame it shows. Recorders hold a [`MediaStream`] and sample the latest
//! frame at their own cadence, the same way a canvas capture stream works.

use tokio::sync::watch;

use crate::frame::VideoFrame;

/// Producer side of a media stream.
#[derive(Debug)]
pub struct FrameFeed {
    label: String,
    width: u32,
    height: u32,
    tx: watch::Sender<Option<VideoFrame>>,
}

impl FrameFeed {
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            label: label.into(),
            width,
            height,
            tx,
        }
    }

    /// Publish a frame, replacing the previous one.
    pub fn publish(&self, frame: VideoFrame) {
        self.tx.send_replace(Some(frame));
    }

    /// Most recently published frame.
    pub fn latest(&self) -> Option<VideoFrame> {
        self.tx.borrow().clone()
    }

    /// A new consumer of this feed.
    pub fn stream(&self) -> MediaStream {
        MediaStream {
            label: self.label.clone(),
            width: self.width,
            height: self.height,
            rx: self.tx.subscribe(),
        }
    }
}

/// Consumer side of a media stream.
#[derive(Debug, Clone)]
pub struct MediaStream {
    label: String,
    width: u32,
    height: u32,
    rx: watch::Receiver<Option<VideoFrame>>,
}

impl MediaStream {
    /// Name of the surface the stream captures (for logging).
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Most recent frame, if the surface has shown one yet.
    pub fn latest_frame(&self) -> Option<VideoFrame> {
        self.rx.borrow().clone()
    }

    /// Wait until a new frame is published. Returns `false` once the
    /// producing surface has been dropped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Color;

    #[test]
    fn test_stream_sees_latest_frame() {
        let feed = FrameFeed::new("canvas", 4, 4);
        let stream = feed.stream();
        assert!(stream.latest_frame().is_none());

        feed.publish(VideoFrame::solid(4, 4, Color::BLACK));
        feed.publish(VideoFrame::solid(4, 4, Color::WHITE));
        assert_eq!(
            stream.latest_frame().unwrap().pixel(0, 0),
            Some([255, 255, 255, 255])
        );
        assert_eq!(stream.label(), "canvas");
        assert_eq!(stream.dimensions(), (4, 4));
    }

    #[tokio::test]
    async fn test_changed_reports_closed_feed() {
        let feed = FrameFeed::new("playback", 2, 2);
        let mut stream = feed.stream();
        feed.publish(VideoFrame::solid(2, 2, Color::BLACK));
        assert!(stream.changed().await);
        drop(feed);
        assert!(!stream.changed().await);
    }
}
