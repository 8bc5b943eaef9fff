use crate::error::ValidationError;
use crate::types::{Border, LayoutResult, Obstacle, RoofPlane};

/// Post-condition check for any produced layout: every panel inside the
/// border, non-degenerate, and clear of every inflated obstacle.
pub fn validate(
    roof: &RoofPlane,
    border: Border,
    layout: &LayoutResult,
    obstacles: &[Obstacle],
) -> Result<(), ValidationError> {
    let (max_x, max_y) = (roof.length - border.x, roof.width - border.y);
    for rect in &layout.placed_rects {
        if !rect.within(border.x, border.y, max_x, max_y) {
            return Err(ValidationError::BorderViolation { rect: *rect });
        }
        if rect.is_degenerate() {
            return Err(ValidationError::DegeneratePanel { rect: *rect });
        }
    }

    for ob in obstacles {
        let zone = ob.inflated();
        if let Some(rect) = layout.placed_rects.iter().find(|r| r.overlaps(&zone)) {
            return Err(ValidationError::Collision {
                panel: *rect,
                obstacle: zone,
            });
        }
    }
    Ok(())
}
