use crate::advisor::Advisor;
use crate::event::{AppEvent, ChatRequest};
use crate::theme::Theme;
use eframe::egui::{self, RichText, ScrollArea};
use std::sync::mpsc::{Receiver, TryRecvError};

pub struct BlushApp {
    rx: Receiver<AppEvent>,
    advisor: Advisor,
    theme: Theme,
    input_buffer: String,
    scroll_to_bottom: bool,
    visuals_applied: bool,
}

impl BlushApp {
    pub fn new(rx: Receiver<AppEvent>, mut advisor: Advisor) -> Self {
        advisor.start();
        Self {
            rx,
            advisor,
            theme: Theme::default(),
            input_buffer: String::new(),
            scroll_to_bottom: false,
            visuals_applied: false,
        }
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if matches!(event, AppEvent::ChatReplied { .. }) {
                        self.scroll_to_bottom = true;
                    }
                    self.advisor.apply_event(event);
                    ctx.request_repaint();
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Blush");
                ui.separator();

                let current = self
                    .advisor
                    .active_category()
                    .unwrap_or("Choose a category")
                    .to_string();
                let mut picked: Option<String> = None;
                egui::ComboBox::from_id_salt("category_filter")
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        for category in self.advisor.categories() {
                            let selected =
                                self.advisor.active_category() == Some(category.as_str());
                            if ui.selectable_label(selected, category).clicked() {
                                picked = Some(category.clone());
                            }
                        }
                    });
                if let Some(category) = picked {
                    self.advisor.select_category(category);
                }

                if self.advisor.is_catalog_loading() {
                    ui.spinner();
                } else if self.advisor.can_retry_catalog() && ui.button("Retry").clicked() {
                    self.advisor.retry_catalog();
                }
            });
        });
    }

    fn render_selection_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("selection_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Selected Products");
                ui.separator();

                let mut removed: Option<String> = None;
                ScrollArea::vertical()
                    .id_salt("selection_tray")
                    .max_height((ui.available_height() - 80.0).max(80.0))
                    .show(ui, |ui| {
                        if self.advisor.selection().is_empty() {
                            ui.label(
                                RichText::new("No products selected").color(self.theme.text_muted),
                            );
                        }
                        for entry in self.advisor.selection().entries() {
                            self.theme.tray_frame().show(ui, |ui| {
                                ui.horizontal(|ui| {
                                    ui.vertical(|ui| {
                                        ui.strong(&entry.name);
                                        ui.label(
                                            RichText::new(&entry.brand)
                                                .color(self.theme.text_muted),
                                        );
                                    });
                                    ui.with_layout(
                                        egui::Layout::right_to_left(egui::Align::Center),
                                        |ui| {
                                            let remove = ui.small_button("×");
                                            if remove.on_hover_text("Remove").clicked() {
                                                removed = Some(entry.name.clone());
                                            }
                                        },
                                    );
                                });
                            });
                        }
                    });
                if let Some(name) = removed {
                    self.advisor.remove_selection(&name);
                }

                ui.separator();
                ui.horizontal(|ui| {
                    let idle = self.advisor.pending().is_none();
                    if ui
                        .add_enabled(idle, egui::Button::new("Generate routine"))
                        .clicked()
                    {
                        self.advisor.generate_routine();
                        self.scroll_to_bottom = true;
                    }
                    if ui.button("Clear all").clicked() {
                        self.advisor.clear_selections();
                    }
                });
            });
    }

    fn render_product_grid(&mut self, ui: &mut egui::Ui) {
        let mut toggled: Option<String> = None;
        let mut learn_more: Option<String> = None;

        ScrollArea::vertical()
            .id_salt("product_grid")
            .max_height(ui.available_height() * 0.5)
            .show(ui, |ui| {
                if self.advisor.active_category().is_none() {
                    ui.label(
                        RichText::new("Select a category to view products")
                            .color(self.theme.text_muted),
                    );
                    return;
                }
                if self.advisor.displayed_products().is_empty()
                    && !self.advisor.is_catalog_loading()
                {
                    ui.label(
                        RichText::new("No products in this category")
                            .color(self.theme.text_muted),
                    );
                }

                ui.horizontal_wrapped(|ui| {
                    for product in self.advisor.displayed_products() {
                        let selected = self.advisor.selection().contains(&product.name);
                        let card = self.theme.card_frame(selected).show(ui, |ui| {
                            ui.set_width(self.theme.card_width);
                            ui.strong(&product.name);
                            ui.label(RichText::new(&product.brand).color(self.theme.text_muted));
                            if selected {
                                ui.label(RichText::new("Selected").color(self.theme.success));
                            }
                            ui.button("Learn more").clicked()
                        });

                        if card.inner {
                            learn_more = Some(product.name.clone());
                        } else if card.response.interact(egui::Sense::click()).clicked() {
                            toggled = Some(product.name.clone());
                        }
                    }
                });
            });

        if let Some(name) = learn_more {
            self.advisor.open_detail(&name);
        } else if let Some(name) = toggled {
            self.advisor.toggle_selection(&name);
        }
    }

    fn render_chat(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.heading("Advisor");
        let transcript_height = (ui.available_height() - 140.0).max(120.0);
        ScrollArea::vertical()
            .id_salt("chat_transcript")
            .max_height(transcript_height)
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for entry in self.advisor.transcript() {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(
                            RichText::new(format!("{}:", entry.speaker.label()))
                                .strong()
                                .color(self.theme.speaker_color(entry.speaker)),
                        );
                        ui.label(&entry.text);
                    });
                }

                if let Some(request) = self.advisor.pending() {
                    let waiting = match request {
                        ChatRequest::Question => "Thinking...",
                        ChatRequest::Routine => "Creating your custom routine...",
                    };
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(RichText::new(waiting).italics().color(self.theme.text_muted));
                    });
                }

                if self.scroll_to_bottom {
                    ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                }
            });
        self.scroll_to_bottom = false;

        ui.separator();
        egui::CollapsingHeader::new("Diagnostics")
            .default_open(false)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .id_salt("diagnostics_log")
                    .max_height(90.0)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for entry in self.advisor.diagnostics() {
                            ui.label(entry);
                        }
                    });
            });

        let idle = self.advisor.pending().is_none();
        let hint = if idle {
            "Ask about skincare, haircare, makeup..."
        } else {
            "Waiting for response..."
        };

        let mut send_now = false;
        ui.horizontal(|ui| {
            let response = ui.add_enabled(
                idle,
                egui::TextEdit::singleline(&mut self.input_buffer)
                    .desired_width(ui.available_width() - 80.0)
                    .hint_text(hint),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                send_now = true;
            }

            send_now |= ui
                .add_enabled(
                    idle && !self.input_buffer.trim().is_empty(),
                    egui::Button::new("Send"),
                )
                .clicked();
        });

        if send_now && idle {
            self.advisor.submit_question(&self.input_buffer);
            self.input_buffer.clear();
            self.scroll_to_bottom = true;
            ctx.request_repaint();
        }
    }

    fn render_detail_modal(&mut self, ctx: &egui::Context) {
        let Some(product) = self.advisor.detail().cloned() else {
            return;
        };

        let modal = egui::Modal::new(egui::Id::new("product_detail")).show(ctx, |ui| {
            ui.set_width(420.0);
            ui.heading(&product.name);
            ui.label(RichText::new(&product.brand).color(self.theme.text_muted));
            if !product.image.is_empty() {
                ui.hyperlink_to("View image", &product.image);
            }
            ui.separator();
            ui.label(&product.description);
            ui.separator();
            ui.button("Close").clicked()
        });

        if modal.inner || modal.should_close() {
            self.advisor.close_detail();
        }
    }
}

impl eframe::App for BlushApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.visuals_applied {
            self.theme.apply_visuals(ctx);
            self.visuals_applied = true;
        }

        self.drain_events(ctx);
        self.render_top_bar(ctx);
        self.render_selection_panel(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_product_grid(ui);
            ui.separator();
            self.render_chat(ui, ctx);
        });
        self.render_detail_modal(ctx);

        if self.advisor.pending().is_some() || self.advisor.is_catalog_loading() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
