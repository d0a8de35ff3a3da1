//! On-page cursor overlay.
//!
//! Injects a colored dot that follows pointer events, so a human watching the
//! visible browser can see what the simulator is doing. Top-level frame only.
//! Purely cosmetic: it has no effect on scheduling or action outcomes.

use crate::browser::PageDriver;
use crate::core::types::SessionError;

const CURSOR_OVERLAY_JS: &str = r#"
(() => {
    // Top-level frame only.
    if (window !== window.parent) return;
    window.addEventListener('DOMContentLoaded', () => {
        const dot = document.createElement('ghostwalk-pointer');
        const style = document.createElement('style');
        style.innerHTML = `
            ghostwalk-pointer {
                pointer-events: none;
                position: absolute;
                top: 0;
                left: 0;
                z-index: 2147483647;
                width: 40px;
                height: 40px;
                background: rgb(211,0,10);
                border-radius: 20px;
                margin: -20px 0 0 -20px;
                padding: 0;
                transition: background .2s, border-radius .2s, border-color .2s, left 1s ease-in-out, top 1s ease-in-out;
                box-shadow: 0 0 5px 0 rgba(211,0,10,.2);
            }
            ghostwalk-pointer.button-1 {
                transition: none;
                background: rgba(211,0,10,.7);
            }
            ghostwalk-pointer.button-2 {
                transition: none;
                border-color: rgba(211,0,10,0.9);
            }
            ghostwalk-pointer.button-3 {
                transition: none;
                border-radius: 4px;
            }
        `;
        document.head.appendChild(style);
        document.body.appendChild(dot);

        const updateButtons = (buttons) => {
            for (let i = 0; i < 5; i++)
                dot.classList.toggle('button-' + i, buttons & (1 << i));
        };

        document.addEventListener('mousemove', (event) => {
            dot.style.left = event.pageX + 'px';
            dot.style.top = event.pageY + 'px';
            updateButtons(event.buttons);
        }, true);
        document.addEventListener('mousedown', (event) => {
            updateButtons(event.buttons);
            dot.classList.add('button-' + event.which);
        }, true);
        document.addEventListener('mouseup', (event) => {
            updateButtons(event.buttons);
            dot.classList.remove('button-' + event.which);
        }, true);
    }, false);
})()
"#;

/// Registers the overlay so it exists in every document the session loads,
/// before first paint.
pub async fn install_cursor_overlay(page: &dyn PageDriver) -> Result<(), SessionError> {
    page.install_on_new_document(CURSOR_OVERLAY_JS).await
}
