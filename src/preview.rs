use crate::navigation::NavigationBridge;
use crate::session::{ImageRef, PageId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalPreview {
    pub image: ImageRef,
    pub target: Option<PageId>,
}

/// Canvas image plus the fullscreen "preview before navigating" overlay.
///
/// The two surfaces are independent: opening or closing the modal never
/// touches the canvas, and picking a canvas image never closes the modal.
pub struct PreviewSync {
    canvas_image: Option<ImageRef>,
    modal: Option<ModalPreview>,
    bridge: NavigationBridge,
}

impl PreviewSync {
    pub fn new(bridge: NavigationBridge) -> Self {
        Self {
            canvas_image: None,
            modal: None,
            bridge,
        }
    }

    pub fn canvas_image(&self) -> Option<&ImageRef> {
        self.canvas_image.as_ref()
    }

    pub fn modal(&self) -> Option<&ModalPreview> {
        self.modal.as_ref()
    }

    pub fn modal_image(&self) -> Option<&ImageRef> {
        self.modal.as_ref().map(|modal| &modal.image)
    }

    pub fn on_image_clicked(&mut self, image: ImageRef) {
        self.canvas_image = Some(image);
    }

    /// Opens the overlay for `image`; without an image there is nothing to show.
    pub fn on_jump_activated(&mut self, target: Option<PageId>, image: Option<ImageRef>) {
        let Some(image) = image else {
            tracing::debug!("jump without preview image ignored");
            return;
        };
        self.modal = Some(ModalPreview { image, target });
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn confirm_jump(&mut self, target: Option<&PageId>) {
        let Some(target) = target else {
            return;
        };
        self.bridge.request_page_change(target);
        self.modal = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::RecordingRouter;

    fn preview() -> (PreviewSync, RecordingRouter) {
        let router = RecordingRouter::default();
        let sync = PreviewSync::new(NavigationBridge::new(Box::new(router.clone())));
        (sync, router)
    }

    #[test]
    fn starts_empty() {
        let (sync, _) = preview();
        assert!(sync.canvas_image().is_none());
        assert!(sync.modal_image().is_none());
    }

    #[test]
    fn image_click_sets_canvas() {
        let (mut sync, _) = preview();
        sync.on_image_clicked(ImageRef::new("/images/01.png"));
        sync.on_image_clicked(ImageRef::new("/images/02.png"));
        assert_eq!(sync.canvas_image(), Some(&ImageRef::new("/images/02.png")));
    }

    #[test]
    fn jump_and_canvas_are_independent() {
        let (mut sync, router) = preview();
        sync.on_image_clicked(ImageRef::new("/images/01.png"));

        sync.on_jump_activated(Some(PageId::new("roomX")), Some(ImageRef::new("imgY")));
        assert_eq!(sync.modal_image(), Some(&ImageRef::new("imgY")));
        assert_eq!(sync.canvas_image(), Some(&ImageRef::new("/images/01.png")));

        sync.on_image_clicked(ImageRef::new("imgZ"));
        assert_eq!(sync.canvas_image(), Some(&ImageRef::new("imgZ")));
        assert_eq!(sync.modal_image(), Some(&ImageRef::new("imgY")));
        assert!(router.requests().is_empty());
    }

    #[test]
    fn jump_without_image_keeps_modal_closed() {
        let (mut sync, _) = preview();
        sync.on_jump_activated(Some(PageId::new("devices")), None);
        assert!(sync.modal().is_none());
    }

    #[test]
    fn close_modal_hides_overlay() {
        let (mut sync, _) = preview();
        sync.on_jump_activated(Some(PageId::new("devices")), Some(ImageRef::new("/images/03.png")));
        sync.close_modal();
        assert!(sync.modal_image().is_none());
    }

    #[test]
    fn confirm_jump_navigates_without_touching_canvas() {
        let (mut sync, router) = preview();
        sync.on_image_clicked(ImageRef::new("/images/01.png"));
        sync.on_jump_activated(Some(PageId::new("devices")), Some(ImageRef::new("/images/03.png")));

        let target = sync.modal().and_then(|modal| modal.target.clone());
        sync.confirm_jump(target.as_ref());

        assert_eq!(router.requests(), [PageId::new("devices")]);
        assert_eq!(sync.canvas_image(), Some(&ImageRef::new("/images/01.png")));
        assert!(sync.modal().is_none());
    }

    #[test]
    fn confirm_jump_without_target_is_a_no_op() {
        let (mut sync, router) = preview();
        sync.on_jump_activated(None, Some(ImageRef::new("/images/03.png")));

        sync.confirm_jump(None);

        assert!(router.requests().is_empty());
        assert!(sync.modal().is_some());
    }
}
