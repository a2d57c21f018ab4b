// SPDX-License-Identifier: MIT OR Apache-2.0
//! Software point-splat rasterizer and the surfaces built on it.

use crate::scene::SharedScene;
use cinetrack_animator::{Camera, PreviewSurface, RenderTarget, TargetLease, Viewport};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::path::Path;

const BACKGROUND: Rgba<u8> = Rgba([16, 18, 24, 255]);

/// Color and depth buffers
#[derive(Debug, Clone)]
pub struct Raster {
    image: RgbaImage,
    depth: Vec<f32>,
}

impl Raster {
    /// Background-filled buffers, at least 1x1
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            image: RgbaImage::from_pixel(width, height, BACKGROUND),
            depth: vec![f32::INFINITY; (width * height) as usize],
        }
    }

    /// Width and height in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = BACKGROUND;
        }
        self.depth.fill(f32::INFINITY);
    }

    /// Draw every point of `scene` as a 3x3 splat seen through `camera`
    pub fn draw(&mut self, camera: &Camera, scene: &SharedScene) {
        self.clear();
        if camera.distance() <= f32::EPSILON {
            return;
        }

        let (width, height) = self.dimensions();
        let aspect = width as f32 / height as f32;
        let view_proj = camera.projection_matrix(aspect) * camera.view_matrix();

        let cloud = scene.read();
        for (point, color) in cloud.points.iter().zip(&cloud.colors) {
            let clip = view_proj * point.extend(1.0);
            if clip.w <= 0.0 {
                continue;
            }
            let ndc = clip.truncate() / clip.w;
            if !ndc.is_finite() || ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 {
                continue;
            }
            if !(0.0..=1.0).contains(&ndc.z) {
                continue;
            }

            let cx = ((ndc.x + 1.0) * 0.5 * width as f32) as i64;
            let cy = ((1.0 - ndc.y) * 0.5 * height as f32) as i64;
            for y in cy - 1..=cy + 1 {
                for x in cx - 1..=cx + 1 {
                    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                        continue;
                    }
                    let idx = (y as u32 * width + x as u32) as usize;
                    if ndc.z < self.depth[idx] {
                        self.depth[idx] = ndc.z;
                        self.image.put_pixel(x as u32, y as u32, Rgba(*color));
                    }
                }
            }
        }
    }

    /// Encode to `path`, choosing the format from its extension
    pub fn save(&self, path: &Path) -> Result<(), image::ImageError> {
        let format = ImageFormat::from_path(path)?;
        match format {
            // No alpha channel in JPEG
            ImageFormat::Jpeg => DynamicImage::ImageRgba8(self.image.clone())
                .to_rgb8()
                .save_with_format(path, format),
            _ => self.image.save_with_format(path, format),
        }
    }

    /// Number of pixels not showing the background
    pub fn covered_pixels(&self) -> usize {
        self.image.pixels().filter(|p| **p != BACKGROUND).count()
    }
}

/// A camera drawing a shared scene into a raster
#[derive(Debug, Clone)]
pub struct SoftwareViewport {
    camera: Camera,
    raster: Raster,
    scene: SharedScene,
    frames_drawn: u64,
}

impl SoftwareViewport {
    /// Viewport with a default camera, nothing drawn yet
    pub fn new(scene: SharedScene, width: u32, height: u32) -> Self {
        Self {
            camera: Camera::new(),
            raster: Raster::new(width, height),
            scene,
            frames_drawn: 0,
        }
    }

    /// Last drawn image
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Number of `render` calls so far
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.raster = Raster::new(width, height);
    }
}

impl Viewport for SoftwareViewport {
    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    fn reset_camera(&mut self) {
        if let Some((min, max)) = self.scene.read().bounds() {
            self.camera.frame_bounds(min, max);
        }
    }

    fn reset_clipping_range(&mut self) {
        if let Some((min, max)) = self.scene.read().bounds() {
            self.camera.reset_clipping_range_for_bounds(min, max);
        }
    }

    fn render(&mut self) {
        self.raster.draw(&self.camera, &self.scene);
        self.frames_drawn += 1;
    }
}

impl PreviewSurface for SoftwareViewport {}

/// Off-screen final render target writing frames with the `image` crate
#[derive(Debug, Clone)]
pub struct SoftwareTarget {
    viewport: SoftwareViewport,
    lease: TargetLease,
}

impl SoftwareTarget {
    /// Target with a free lease drawing `scene` at `width`x`height`
    pub fn new(scene: SharedScene, width: u32, height: u32) -> Self {
        Self {
            viewport: SoftwareViewport::new(scene, width, height),
            lease: TargetLease::new(),
        }
    }

    /// The underlying viewport
    pub fn viewport(&self) -> &SoftwareViewport {
        &self.viewport
    }
}

impl Viewport for SoftwareTarget {
    fn camera(&self) -> &Camera {
        self.viewport.camera()
    }

    fn camera_mut(&mut self) -> &mut Camera {
        self.viewport.camera_mut()
    }

    fn reset_camera(&mut self) {
        self.viewport.reset_camera();
    }

    fn reset_clipping_range(&mut self) {
        self.viewport.reset_clipping_range();
    }

    fn render(&mut self) {
        self.viewport.render();
    }
}

impl RenderTarget for SoftwareTarget {
    fn is_active(&self) -> bool {
        true
    }

    fn has_loaded_modules(&self) -> bool {
        !self.viewport.scene.read().is_empty()
    }

    fn save_current_frame(&mut self, path: &Path) -> std::io::Result<()> {
        self.viewport
            .raster
            .save(path)
            .map_err(std::io::Error::other)
    }

    fn set_size(&mut self, width: u32, height: u32) {
        tracing::debug!("Resizing render target to {width}x{height}");
        self.viewport.resize(width, height);
    }

    fn lease(&self) -> &TargetLease {
        &self.lease
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::PointCloud;
    use glam::Vec3;
    use parking_lot::RwLock;
    use std::sync::Arc;

    fn single_point() -> SharedScene {
        Arc::new(RwLock::new(PointCloud {
            points: vec![Vec3::ZERO],
            colors: vec![[255, 0, 0, 255]],
        }))
    }

    fn looking_at_origin() -> Camera {
        let mut camera = Camera::new();
        camera.position = Vec3::new(0.0, -10.0, 0.0);
        camera.view_up = Vec3::Z;
        camera.clipping_range = (0.1, 100.0);
        camera
    }

    #[test]
    fn test_point_lands_in_center() {
        let scene = single_point();
        let mut raster = Raster::new(64, 48);
        raster.draw(&looking_at_origin(), &scene);

        assert_eq!(raster.covered_pixels(), 9);
        assert_eq!(*raster.image.get_pixel(32, 24), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_points_behind_camera_are_skipped() {
        let scene = single_point();
        let mut camera = looking_at_origin();
        camera.focal_point = Vec3::new(0.0, -20.0, 0.0);
        let mut raster = Raster::new(64, 48);
        raster.draw(&camera, &scene);
        assert_eq!(raster.covered_pixels(), 0);
    }

    #[test]
    fn test_reset_camera_frames_scene() {
        let mut viewport = SoftwareViewport::new(single_point(), 32, 32);
        viewport.camera_mut().position = Vec3::new(0.0, -3.0, 0.0);
        viewport.camera_mut().focal_point = Vec3::new(5.0, 5.0, 5.0);
        viewport.reset_camera();
        assert_eq!(viewport.camera().focal_point, Vec3::ZERO);
        viewport.render();
        assert_eq!(viewport.frames_drawn(), 1);
        assert!(viewport.raster().covered_pixels() > 0);
    }

    #[test]
    fn test_save_and_resize() {
        let dir = std::env::temp_dir().join(format!("cinetrack-raster-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let scene = single_point();
        let mut target = SoftwareTarget::new(scene, 16, 16);
        target.set_size(40, 30);
        *target.camera_mut() = looking_at_origin();
        target.render();

        let png = dir.join("frame.png");
        target.save_current_frame(&png).unwrap();
        let loaded = image::open(&png).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (40, 30));

        let jpg = dir.join("frame.jpg");
        target.save_current_frame(&jpg).unwrap();
        assert!(jpg.exists());

        let err = target.save_current_frame(&dir.join("frame.xyz")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
    }

    #[test]
    fn test_modules_follow_scene() {
        let scene = single_point();
        let target = SoftwareTarget::new(Arc::clone(&scene), 8, 8);
        assert!(target.has_loaded_modules());
        scene.write().points.clear();
        assert!(!target.has_loaded_modules());
    }
}
